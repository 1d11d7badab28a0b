use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use crate::controller::AnimationController;
use crate::error::ControlError;
use crate::leds::LedOutput;
use crate::presets::PresetStore;

use crate::registry::NO_EFFECT;

/// A remote control request, independent of the protocol it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `None` deselects the active animation.
    Effect(Option<String>),
    Start,
    Stop,
    Speed(f32),
    Preset(String),
}

impl Command {
    /// Maps the user facing effect name, where `"None"` means no animation.
    pub fn effect(name: &str) -> Command {
        if name == NO_EFFECT {
            Command::Effect(None)
        } else {
            Command::Effect(Some(name.to_string()))
        }
    }
}

/// Everything the host loop and the control planes share. Lives behind one lock,
/// so a tick never sees a half applied request.
pub struct Controls {
    pub animations: AnimationController,
    pub presets: PresetStore,
    watchers: Vec<Sender<()>>,
}

impl Controls {
    pub fn new(animations: AnimationController, presets: PresetStore) -> Controls {
        Controls {
            animations,
            presets,
            watchers: vec![],
        }
    }

    /// Gets a message after every accepted command, whichever control plane it came from.
    /// Dropping the receiver unsubscribes.
    pub fn watch(&mut self) -> Receiver<()> {
        let (tx, rx) = mpsc::channel();
        self.watchers.push(tx);
        rx
    }

    fn notify(&mut self) {
        self.watchers.retain(|tx| tx.send(()).is_ok());
    }

    pub fn apply(&mut self, command: Command) -> Result<(), ControlError> {
        match command {
            Command::Effect(Some(name)) => self.animations.select_by_name(&name)?,
            Command::Effect(None) => self.animations.clear(),
            Command::Start => self.animations.start(),
            Command::Stop => self.animations.stop(),
            Command::Speed(speed) => self.animations.set_speed(speed)?,
            Command::Preset(name) => self.presets.select(&name)?,
        }
        self.notify();
        Ok(())
    }

    /// Applies every command, logging the ones that get rejected.
    pub fn apply_all(&mut self, commands: Vec<Command>) -> Vec<ControlError> {
        let mut errors = vec![];
        for command in commands {
            if let Err(err) = self.apply(command) {
                log::warn!("Rejected request: {err}");
                errors.push(err);
            }
        }
        errors
    }

    pub fn tick(&mut self, now: Instant, leds: &mut dyn LedOutput) -> bool {
        self.animations.tick(now, leds, &self.presets)
    }

    pub fn effect_name(&self) -> &str {
        self.animations.active_name().unwrap_or(NO_EFFECT)
    }

    /// `"None"` followed by every registered animation.
    pub fn effect_list(&self) -> Vec<String> {
        std::iter::once(NO_EFFECT)
            .chain(self.animations.registry().names())
            .map(str::to_string)
            .collect()
    }
}
