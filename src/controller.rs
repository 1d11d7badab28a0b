//! The animation state machine.
//!
//! Selection (which animation is active) and run state (whether it may
//! advance) are independent. The host loop calls [`AnimationController::tick`]
//! as often as it likes; a frame is only drawn once the delay the animation
//! asked for, divided by the speed multiplier, has passed.

use std::time::{Duration, Instant};

use crate::effects::Stage;
use crate::error::AnimationError;
use crate::leds::LedOutput;
use crate::presets::PresetSource;
use crate::registry::{EffectDescriptor, EffectId, EffectRegistry};

pub const DEFAULT_SPEED: f32 = 1.0;

/// Upper bound for a single scheduled interval, keeps tiny speeds from overflowing `Instant`.
const MAX_FRAME_INTERVAL: Duration = Duration::from_secs(3600);

pub struct AnimationController {
    registry: EffectRegistry,
    active: Option<EffectId>,
    running: bool,
    speed: f32,
    /// `None` means due immediately.
    next_due: Option<Instant>,
    needs_init: bool,
}

impl AnimationController {
    pub fn new(registry: EffectRegistry) -> AnimationController {
        AnimationController {
            registry,
            active: None,
            running: false,
            speed: DEFAULT_SPEED,
            next_due: None,
            needs_init: false,
        }
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// `id` has to come from this controller's registry.
    pub fn select_by_descriptor(&mut self, id: EffectId) {
        self.active = Some(id);
        self.next_due = None;
        self.needs_init = true;
        log::info!("Animation {} selected", self.registry.get(id).name());
    }

    pub fn select_by_name(&mut self, name: &str) -> Result<(), AnimationError> {
        let id = self
            .registry
            .lookup(name)
            .map(|d| d.id())
            .ok_or_else(|| AnimationError::NotFound(name.to_string()))?;
        self.select_by_descriptor(id);
        Ok(())
    }

    /// Deselects the active animation. The LEDs keep showing the last frame.
    pub fn clear(&mut self) {
        self.active = None;
        self.next_due = None;
        self.needs_init = false;
        log::info!("Animation cleared");
    }

    pub fn start(&mut self) {
        self.running = true;
        log::info!("Animations started");
    }

    /// Leaves the schedule alone, so `start` resumes where the animation left off.
    pub fn stop(&mut self) {
        self.running = false;
        log::info!("Animations stopped");
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), AnimationError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(AnimationError::InvalidArgument(speed));
        }

        self.speed = speed;
        log::info!("Animation speed set to {speed}");
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn active(&self) -> Option<&EffectDescriptor> {
        self.active.map(|id| self.registry.get(id))
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active().map(|d| d.name())
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// When the host loop has to call `tick` next, `None` while there is nothing to animate.
    pub fn wake_at(&self, now: Instant) -> Option<Instant> {
        if !self.running || self.active.is_none() {
            return None;
        }
        Some(self.next_due().unwrap_or(now))
    }

    /// Advances the active animation if it is due. Returns whether a frame was drawn.
    pub fn tick(
        &mut self,
        now: Instant,
        leds: &mut dyn LedOutput,
        presets: &dyn PresetSource,
    ) -> bool {
        if !self.running {
            return false;
        }
        let Some(id) = self.active else {
            return false;
        };
        if let Some(next_due) = self.next_due {
            if now < next_due {
                return false;
            }
        }

        let init = std::mem::take(&mut self.needs_init);
        let descriptor = self.registry.get_mut(id);
        let preset = if descriptor.ignores_presets() {
            None
        } else {
            presets.active_preset()
        };

        let mut stage = Stage::new(leds, preset);
        let raw_delay = descriptor.effect_mut().step(init, &mut stage);
        self.next_due = Some(now + self.scaled_interval(raw_delay));
        true
    }

    fn scaled_interval(&self, raw_delay_ms: u32) -> Duration {
        let micros = (f64::from(raw_delay_ms) * 1000.0 / f64::from(self.speed)).round();
        Duration::from_micros(micros as u64).min(MAX_FRAME_INTERVAL)
    }
}
