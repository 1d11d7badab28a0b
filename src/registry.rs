//! Catalog of the animations the installation knows about.
//!
//! The registry is filled once during startup and handed to the
//! [`AnimationController`](crate::controller::AnimationController), which only
//! gives out shared references afterwards. Membership never changes at runtime.

use std::fmt;

use crate::effects::LightingEffect;
use crate::error::AnimationError;

/// Effect name control planes use for "no animation", never registered.
pub const NO_EFFECT: &str = "None";

/// Stable handle of a registered animation, its position in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectId(usize);

pub struct EffectDescriptor {
    id: EffectId,
    name: String,
    ignores_presets: bool,
    effect: Box<dyn LightingEffect>,
}

impl EffectDescriptor {
    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the animation owns the whole output instead of drawing on top of the active preset.
    pub fn ignores_presets(&self) -> bool {
        self.ignores_presets
    }

    pub(crate) fn effect_mut(&mut self) -> &mut dyn LightingEffect {
        self.effect.as_mut()
    }
}

impl fmt::Debug for EffectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("ignores_presets", &self.ignores_presets)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct EffectRegistry {
    descriptors: Vec<EffectDescriptor>,
}

impl EffectRegistry {
    pub fn new() -> EffectRegistry {
        EffectRegistry {
            descriptors: Vec::new(),
        }
    }

    /// Adds an animation. Names are case sensitive, must be unique and must not be [`NO_EFFECT`].
    pub fn register(
        &mut self,
        name: &str,
        ignores_presets: bool,
        effect: Box<dyn LightingEffect>,
    ) -> Result<EffectId, AnimationError> {
        if name.is_empty() {
            return Err(AnimationError::EmptyName);
        }
        if name == NO_EFFECT {
            return Err(AnimationError::ReservedName(name.to_string()));
        }
        if self.lookup(name).is_some() {
            return Err(AnimationError::DuplicateName(name.to_string()));
        }

        let id = EffectId(self.descriptors.len());
        self.descriptors.push(EffectDescriptor {
            id,
            name: name.to_string(),
            ignores_presets,
            effect,
        });
        log::debug!("Registered animation {name} as {id:?}");
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<&EffectDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn get(&self, id: EffectId) -> &EffectDescriptor {
        &self.descriptors[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: EffectId) -> &mut EffectDescriptor {
        &mut self.descriptors[id.0]
    }

    /// Registration order.
    pub fn all(&self) -> &[EffectDescriptor] {
        &self.descriptors
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name()).collect()
    }
}
