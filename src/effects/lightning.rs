use palette::Mix;
use rand::Rng;

use crate::effects::{LightingEffect, Pulse, Stage};

const STEP_MS: u32 = 30;
const BACKGROUND_LEVEL: f32 = 0.3;

/// White strikes at random positions, fading out over a dimmed preset.
pub struct Lightning {
    peak_falloff: f32,
    strike_chance: f64,
    pulses: Vec<Pulse>,
}

impl Lightning {
    pub fn new() -> Lightning {
        Lightning::with_strike_chance(0.08)
    }

    pub fn with_strike_chance(strike_chance: f64) -> Lightning {
        Lightning {
            peak_falloff: 0.8,
            strike_chance: strike_chance.clamp(0.0, 1.0),
            pulses: vec![],
        }
    }

    fn decay_strikes(&mut self) {
        for pulse in &mut self.pulses {
            pulse.intensity *= self.peak_falloff;
        }
    }

    fn remove_strikes(&mut self, pixel_count: usize) {
        self.pulses
            .retain(|pulse| pulse.intensity > 0.1 && (pulse.position as usize) < pixel_count);
    }

    fn create_strike(&mut self, pixel_count: usize) {
        let mut rng = rand::thread_rng();
        if !rng.gen_bool(self.strike_chance) {
            return;
        }

        let white = palette::LinSrgb::new(1.0, 1.0, 1.0);
        self.pulses.push(Pulse {
            color: white,
            position: rng.gen_range(0..pixel_count) as f32,
            intensity: 1.0,
        });
    }
}

impl LightingEffect for Lightning {
    fn step(&mut self, init: bool, stage: &mut Stage) -> u32 {
        let pixel_count = stage.pixel_count();
        if init {
            self.pulses.clear();
        }

        self.decay_strikes();
        self.remove_strikes(pixel_count);
        if pixel_count > 0 {
            self.create_strike(pixel_count);
        }

        let black = palette::LinSrgb::new(0.0, 0.0, 0.0);
        let mut frame_buffer: Vec<palette::LinSrgb> = (0..pixel_count)
            .map(|i| black.mix(stage.preset_color(i), BACKGROUND_LEVEL))
            .collect();

        // Strike draw pass
        for pulse in &self.pulses {
            let pixel = &mut frame_buffer[pulse.position as usize];
            *pixel = pixel.mix(pulse.color, pulse.intensity);
        }

        for (i, pixel) in frame_buffer.into_iter().enumerate() {
            stage.set(i, pixel);
        }
        stage.show();

        STEP_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leds::tests::RecordingLeds;
    use crate::presets::Preset;

    #[test]
    fn calm_sky_shows_dimmed_preset() {
        let preset = Preset::new("white", vec![]);
        let mut leds = RecordingLeds::new(5);
        let mut lightning = Lightning::with_strike_chance(0.0);

        lightning.step(true, &mut Stage::new(&mut leds, Some(&preset)));

        for pixel in leds.last_frame() {
            assert!((pixel.red - BACKGROUND_LEVEL).abs() < 0.01);
        }
    }

    #[test]
    fn strikes_brighten_and_fade() {
        let preset = Preset::new("white", vec![]);
        let mut leds = RecordingLeds::new(5);
        let mut lightning = Lightning::with_strike_chance(1.0);

        lightning.step(true, &mut Stage::new(&mut leds, Some(&preset)));
        let brightest = leds
            .last_frame()
            .iter()
            .map(|p| p.red)
            .fold(0.0f32, f32::max);
        assert!(brightest > 0.99);

        lightning.strike_chance = 0.0;
        for _ in 0..20 {
            lightning.step(false, &mut Stage::new(&mut leds, Some(&preset)));
        }
        assert!(lightning.pulses.is_empty());
    }

    #[test]
    fn init_clears_strikes() {
        let preset = Preset::new("white", vec![]);
        let mut leds = RecordingLeds::new(3);
        let mut lightning = Lightning::with_strike_chance(1.0);
        lightning.step(true, &mut Stage::new(&mut leds, Some(&preset)));
        lightning.step(false, &mut Stage::new(&mut leds, Some(&preset)));
        assert_eq!(lightning.pulses.len(), 2);

        lightning.strike_chance = 0.0;
        lightning.step(true, &mut Stage::new(&mut leds, Some(&preset)));
        assert!(lightning.pulses.is_empty());
    }

    #[test]
    fn empty_strip_is_fine() {
        let mut leds = RecordingLeds::new(0);
        let mut lightning = Lightning::with_strike_chance(1.0);
        assert_eq!(lightning.step(true, &mut Stage::new(&mut leds, None)), STEP_MS);
    }
}
