use palette::Srgb;

use crate::error::PresetError;

/// A static color pattern, repeated along the strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    name: String,
    colors: Vec<palette::LinSrgb>,
}

impl Preset {
    pub fn new(name: &str, colors: Vec<palette::LinSrgb>) -> Preset {
        let colors = if colors.is_empty() {
            vec![palette::LinSrgb::new(1.0, 1.0, 1.0)]
        } else {
            colors
        };

        Preset {
            name: name.to_string(),
            colors,
        }
    }

    pub fn from_rgb8(name: &str, colors: &[[u8; 3]]) -> Preset {
        let colors = colors
            .iter()
            .map(|[r, g, b]| Srgb::new(*r, *g, *b).into_format::<f32>().into_linear())
            .collect();
        Preset::new(name, colors)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn colors(&self) -> &[palette::LinSrgb] {
        &self.colors
    }

    /// The pattern color for pixel `index`, wrapping around the pattern.
    pub fn color_at(&self, index: usize) -> palette::LinSrgb {
        self.colors[index % self.colors.len()]
    }
}

/// Where animations that layer on top of presets get their base colors from.
pub trait PresetSource {
    fn active_preset(&self) -> Option<&Preset>;
}

pub struct PresetStore {
    presets: Vec<Preset>,
    active: usize,
}

impl PresetStore {
    /// Falls back to a single white preset when `presets` is empty.
    pub fn new(presets: Vec<Preset>) -> PresetStore {
        let presets = if presets.is_empty() {
            vec![Preset::new("white", vec![])]
        } else {
            presets
        };

        PresetStore { presets, active: 0 }
    }

    pub fn select(&mut self, name: &str) -> Result<(), PresetError> {
        match self.presets.iter().position(|p| p.name == name) {
            Some(index) => {
                self.active = index;
                log::info!("Preset {name} selected");
                Ok(())
            }
            None => Err(PresetError::NotFound(name.to_string())),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name()).collect()
    }

    pub fn active_name(&self) -> &str {
        self.presets[self.active].name()
    }
}

impl PresetSource for PresetStore {
    fn active_preset(&self) -> Option<&Preset> {
        self.presets.get(self.active)
    }
}
