use crate::effects::{LightingEffect, Stage};

const REFRESH_MS: u32 = 1000;

/// Shows the active preset as is.
pub struct Solid {}

impl Solid {
    pub fn new() -> Solid {
        Solid {}
    }
}

impl LightingEffect for Solid {
    fn step(&mut self, _: bool, stage: &mut Stage) -> u32 {
        for i in 0..stage.pixel_count() {
            let color = stage.preset_color(i);
            stage.set(i, color);
        }
        stage.show();
        REFRESH_MS
    }
}
