use std::f32::consts::TAU;

use palette::Mix;

use crate::effects::{LightingEffect, Stage};

const STEP_MS: u32 = 20;
const STEPS_PER_BREATH: u32 = 150;

/// Fades the preset in and out of black.
pub struct Breathe {
    phase: u32,
}

impl Breathe {
    pub fn new() -> Breathe {
        Breathe { phase: 0 }
    }

    fn level(&self) -> f32 {
        let angle = TAU * self.phase as f32 / STEPS_PER_BREATH as f32;
        ((1.0 - angle.cos()) / 2.0).clamp(0.0, 1.0)
    }
}

impl LightingEffect for Breathe {
    fn step(&mut self, init: bool, stage: &mut Stage) -> u32 {
        if init {
            self.phase = 0;
        }

        let black = palette::LinSrgb::new(0.0, 0.0, 0.0);
        let level = self.level();
        for i in 0..stage.pixel_count() {
            let color = black.mix(stage.preset_color(i), level);
            stage.set(i, color);
        }
        stage.show();

        self.phase = (self.phase + 1) % STEPS_PER_BREATH;
        STEP_MS
    }
}
