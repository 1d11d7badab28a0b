use crate::effects::{LightingEffect, Stage};

const HALF_PERIOD_MS: u32 = 500;

pub struct Blink {
    lit: bool,
}

impl Blink {
    pub fn new() -> Blink {
        Blink { lit: false }
    }
}

impl LightingEffect for Blink {
    fn step(&mut self, init: bool, stage: &mut Stage) -> u32 {
        self.lit = init || !self.lit;

        if self.lit {
            for i in 0..stage.pixel_count() {
                let color = stage.preset_color(i);
                stage.set(i, color);
            }
        } else {
            stage.fill(palette::LinSrgb::new(0.0, 0.0, 0.0));
        }
        stage.show();

        HALF_PERIOD_MS
    }
}
