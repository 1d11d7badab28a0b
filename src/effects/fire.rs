use rand::Rng;

use crate::effects::{LightingEffect, Stage};

const STEP_MS: u32 = 50;
/// How much the flames cool down per frame, higher means shorter flames.
const COOLING: usize = 55;
/// Chance out of 255 for a new spark per frame.
const SPARKING: u8 = 120;
/// Sparks are lit within this many pixels from the start of the strip.
const SPARK_ZONE: usize = 7;

/// Flames rising from the start of the strip. Heat simulation per pixel, mapped to black-red-yellow-white.
pub struct Fire {
    heat: Vec<u8>,
}

impl Fire {
    pub fn new() -> Fire {
        Fire { heat: vec![] }
    }

    fn simulate(&mut self) {
        let mut rng = rand::thread_rng();
        let pixel_count = self.heat.len();
        let max_cooling = (COOLING * 10 / pixel_count + 2).min(u8::MAX as usize) as u8;

        for heat in &mut self.heat {
            *heat = heat.saturating_sub(rng.gen_range(0..=max_cooling));
        }

        // Heat drifts upwards and diffuses
        for k in (2..pixel_count).rev() {
            let sum = self.heat[k - 1] as u16 + 2 * self.heat[k - 2] as u16;
            self.heat[k] = (sum / 3) as u8;
        }

        if rng.gen::<u8>() < SPARKING {
            let y = rng.gen_range(0..SPARK_ZONE.min(pixel_count));
            self.heat[y] = self.heat[y].saturating_add(rng.gen_range(160..=255));
        }
    }
}

fn heat_to_color(heat: u8) -> palette::LinSrgb {
    let t = heat as f32 / 255.0 * 3.0;
    if t < 1.0 {
        palette::LinSrgb::new(t, 0.0, 0.0)
    } else if t < 2.0 {
        palette::LinSrgb::new(1.0, t - 1.0, 0.0)
    } else {
        palette::LinSrgb::new(1.0, 1.0, t - 2.0)
    }
}

impl LightingEffect for Fire {
    fn step(&mut self, init: bool, stage: &mut Stage) -> u32 {
        let pixel_count = stage.pixel_count();
        if init || self.heat.len() != pixel_count {
            self.heat = vec![0; pixel_count];
        }

        if pixel_count > 0 {
            self.simulate();
        }

        for (i, heat) in self.heat.iter().enumerate() {
            stage.set(i, heat_to_color(*heat));
        }
        stage.show();

        STEP_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leds::tests::RecordingLeds;

    #[test]
    fn heat_palette_endpoints() {
        assert_eq!(heat_to_color(0), palette::LinSrgb::new(0.0, 0.0, 0.0));
        let hottest = heat_to_color(255);
        assert_eq!(hottest.red, 1.0);
        assert_eq!(hottest.green, 1.0);
        assert!(hottest.blue > 0.99);
    }

    #[test]
    fn colors_stay_in_range() {
        let mut leds = RecordingLeds::new(30);
        let mut fire = Fire::new();

        fire.step(true, &mut Stage::new(&mut leds, None));
        for _ in 0..200 {
            fire.step(false, &mut Stage::new(&mut leds, None));
        }

        assert_eq!(leds.shown.len(), 201);
        for pixel in leds.last_frame() {
            for channel in [pixel.red, pixel.green, pixel.blue] {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn init_starts_cold() {
        let mut leds = RecordingLeds::new(10);
        let mut fire = Fire::new();
        for _ in 0..50 {
            fire.step(false, &mut Stage::new(&mut leds, None));
        }

        fire.heat = vec![255; 10];
        fire.step(true, &mut Stage::new(&mut leds, None));

        // Only the spark zone can be lit right after a restart
        assert!(fire.heat[SPARK_ZONE..].iter().all(|h| *h == 0));
    }

    #[test]
    fn handles_tiny_strips() {
        for pixel_count in [0, 1, 2] {
            let mut leds = RecordingLeds::new(pixel_count);
            let mut fire = Fire::new();
            for _ in 0..20 {
                assert_eq!(fire.step(false, &mut Stage::new(&mut leds, None)), STEP_MS);
            }
        }
    }
}
