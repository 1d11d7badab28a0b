pub(crate) mod blink;
pub(crate) mod breathe;
pub(crate) mod fire;
pub(crate) mod flow;
pub(crate) mod lightning;
pub(crate) mod march;
pub(crate) mod rainbow;
pub(crate) mod solid;

use crate::error::AnimationError;
use crate::leds::LedOutput;
use crate::presets::Preset;
use crate::registry::EffectRegistry;

/// One named animation. Implementations keep whatever state they need between frames.
pub trait LightingEffect: Send {
    /// Draws the next frame and returns how many milliseconds should pass
    /// before the next call. `init` is set on the first call after the
    /// animation got selected.
    fn step(&mut self, init: bool, stage: &mut Stage) -> u32;
}

/// What an animation gets to work with during one step.
pub struct Stage<'a> {
    leds: &'a mut dyn LedOutput,
    preset: Option<&'a Preset>,
}

impl<'a> Stage<'a> {
    pub fn new(leds: &'a mut dyn LedOutput, preset: Option<&'a Preset>) -> Stage<'a> {
        Stage { leds, preset }
    }

    pub fn pixel_count(&self) -> usize {
        self.leds.pixel_count()
    }

    /// `None` for animations that ignore presets.
    pub fn preset(&self) -> Option<&Preset> {
        self.preset
    }

    pub fn preset_color(&self, index: usize) -> palette::LinSrgb {
        match self.preset {
            Some(preset) => preset.color_at(index),
            None => palette::LinSrgb::new(1.0, 1.0, 1.0),
        }
    }

    pub fn set(&mut self, index: usize, color: palette::LinSrgb) {
        self.leds.set(index, color);
    }

    pub fn fill(&mut self, color: palette::LinSrgb) {
        self.leds.fill(color);
    }

    pub fn show(&mut self) {
        self.leds.show();
    }
}

struct Pulse {
    color: palette::LinSrgb,
    intensity: f32,
    position: f32,
}

/// All animations that ship with the installation, in the order they are offered to users.
pub fn builtin_registry() -> Result<EffectRegistry, AnimationError> {
    let mut registry = EffectRegistry::new();
    registry.register("solid", false, Box::new(solid::Solid::new()))?;
    registry.register("march", false, Box::new(march::March::new()))?;
    registry.register("blink", false, Box::new(blink::Blink::new()))?;
    registry.register("breathe", false, Box::new(breathe::Breathe::new()))?;
    registry.register("lightning", false, Box::new(lightning::Lightning::new()))?;
    registry.register("rainbow", true, Box::new(rainbow::Rainbow::new()))?;
    registry.register("fire", true, Box::new(fire::Fire::new()))?;
    registry.register("flow", true, Box::new(flow::Flow::new()))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_animations_in_order() {
        let registry = builtin_registry().unwrap();
        assert_eq!(
            registry.names(),
            vec!["solid", "march", "blink", "breathe", "lightning", "rainbow", "fire", "flow"]
        );
    }

    #[test]
    fn only_generative_animations_ignore_presets() {
        let registry = builtin_registry().unwrap();
        let ignoring: Vec<&str> = registry
            .all()
            .iter()
            .filter(|d| d.ignores_presets())
            .map(|d| d.name())
            .collect();
        assert_eq!(ignoring, vec!["rainbow", "fire", "flow"]);
    }
}
