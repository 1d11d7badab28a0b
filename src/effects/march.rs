use crate::effects::{LightingEffect, Stage};

const STEP_MS: u32 = 100;

/// Walks the preset pattern along the strip, one pixel per frame.
pub struct March {
    offset: usize,
}

impl March {
    pub fn new() -> March {
        March { offset: 0 }
    }
}

impl LightingEffect for March {
    fn step(&mut self, init: bool, stage: &mut Stage) -> u32 {
        if init {
            self.offset = 0;
        }

        let pattern_len = stage.preset().map_or(1, |p| p.colors().len());
        self.offset %= pattern_len;
        for i in 0..stage.pixel_count() {
            // Shifting towards the end of the strip means reading from behind.
            let color = stage.preset_color(i + pattern_len - self.offset);
            stage.set(i, color);
        }
        stage.show();

        self.offset = (self.offset + 1) % pattern_len;
        STEP_MS
    }
}
