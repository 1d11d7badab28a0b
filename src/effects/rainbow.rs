use palette::{FromColor, Hsv, Srgb};

use crate::effects::{LightingEffect, Stage};

const STEP_MS: u32 = 20;
const HUE_STEP: f32 = 2.0;

/// The full hue wheel spread over the strip, slowly rotating.
pub struct Rainbow {
    hue: f32,
}

impl Rainbow {
    pub fn new() -> Rainbow {
        Rainbow { hue: 0.0 }
    }
}

fn hue_to_color(hue: f32) -> palette::LinSrgb {
    let hsv: Hsv = Hsv::new(hue, 1.0, 1.0);
    Srgb::<f32>::from_color(hsv).into_linear()
}

impl LightingEffect for Rainbow {
    fn step(&mut self, init: bool, stage: &mut Stage) -> u32 {
        if init {
            self.hue = 0.0;
        }

        let pixel_count = stage.pixel_count();
        for i in 0..pixel_count {
            let hue = self.hue + 360.0 * i as f32 / pixel_count as f32;
            stage.set(i, hue_to_color(hue % 360.0));
        }
        stage.show();

        self.hue = (self.hue + HUE_STEP) % 360.0;
        STEP_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leds::tests::{same_color, RecordingLeds};

    #[test]
    fn spreads_hues_over_strip() {
        let mut leds = RecordingLeds::new(3);
        let mut rainbow = Rainbow::new();

        rainbow.step(true, &mut Stage::new(&mut leds, None));

        let frame = leds.last_frame();
        assert!(same_color(frame[0], palette::LinSrgb::new(1.0, 0.0, 0.0)));
        assert!(same_color(frame[1], palette::LinSrgb::new(0.0, 1.0, 0.0)));
        assert!(same_color(frame[2], palette::LinSrgb::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn rotates_and_rewinds_on_init() {
        let mut leds = RecordingLeds::new(1);
        let mut rainbow = Rainbow::new();

        rainbow.step(true, &mut Stage::new(&mut leds, None));
        rainbow.step(false, &mut Stage::new(&mut leds, None));
        rainbow.step(true, &mut Stage::new(&mut leds, None));

        assert_ne!(leds.shown[0], leds.shown[1]);
        assert_eq!(leds.shown[0], leds.shown[2]);
    }
}
