use palette::{FromColor, Hsv, Mix, Srgb};
use rand::Rng;

use crate::effects::{LightingEffect, Pulse, Stage};

const STEP_MS: u32 = 30;
/// Golden angle, so consecutive pulses never look alike.
const HUE_SPACING: f32 = 137.5;

/// Colored pulses travelling from the start to the end of the strip.
pub struct Flow {
    pulse_speed: f32,
    spawn_chance: f64,
    next_hue: f32,
    pulses: Vec<Pulse>,
}

impl Flow {
    pub fn new() -> Flow {
        Flow::with_spawn_chance(0.15)
    }

    pub fn with_spawn_chance(spawn_chance: f64) -> Flow {
        Flow {
            pulse_speed: 0.5,
            spawn_chance: spawn_chance.clamp(0.0, 1.0),
            next_hue: 0.0,
            pulses: vec![],
        }
    }

    fn advance_pulses(&mut self) {
        for pulse in &mut self.pulses {
            pulse.position += self.pulse_speed;
        }
    }

    fn remove_pulses(&mut self, pixel_count: usize) {
        let end = pixel_count as f32 - 1.0;
        self.pulses.retain(|pulse| pulse.position <= end);
    }

    fn create_pulse(&mut self) {
        if let Some(last_pulse) = self.pulses.last() {
            if last_pulse.position < 1.0 {
                return;
            }
        }
        if !rand::thread_rng().gen_bool(self.spawn_chance) {
            return;
        }

        let hsv: Hsv = Hsv::new(self.next_hue, 1.0, 1.0);
        self.next_hue = (self.next_hue + HUE_SPACING) % 360.0;
        self.pulses.push(Pulse {
            color: Srgb::<f32>::from_color(hsv).into_linear(),
            position: 0.0,
            intensity: 1.0,
        });
    }
}

impl LightingEffect for Flow {
    fn step(&mut self, init: bool, stage: &mut Stage) -> u32 {
        let pixel_count = stage.pixel_count();
        if init {
            self.pulses.clear();
            self.next_hue = 0.0;
        }

        self.advance_pulses();
        self.remove_pulses(pixel_count);
        if pixel_count > 0 {
            self.create_pulse();
        }

        let black = palette::LinSrgb::new(0.0, 0.0, 0.0);
        let mut frame_buffer = vec![black; pixel_count];

        // Pulse draw pass, spread over the two nearest pixels
        for pulse in &self.pulses {
            let trailing_pixel = pulse.position.floor() as usize;
            let leading_alpha = pulse.position.fract() * pulse.intensity;
            let trailing_alpha = pulse.intensity - leading_alpha;

            let trailing = &mut frame_buffer[trailing_pixel];
            *trailing = trailing.mix(pulse.color, trailing_alpha);
            if let Some(leading) = frame_buffer.get_mut(trailing_pixel + 1) {
                *leading = leading.mix(pulse.color, leading_alpha);
            }
        }

        for (i, pixel) in frame_buffer.into_iter().enumerate() {
            stage.set(i, pixel);
        }
        stage.show();

        STEP_MS
    }
}
