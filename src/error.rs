use thiserror::Error;

/// Failures of the effect registry and the animation controller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("no animation named {0:?}")]
    NotFound(String),
    #[error("invalid speed {0}, must be finite and greater than zero")]
    InvalidArgument(f32),
    #[error("animation {0:?} is registered twice")]
    DuplicateName(String),
    #[error("animation names must not be empty")]
    EmptyName,
    #[error("{0:?} is reserved for \"no animation\"")]
    ReservedName(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PresetError {
    #[error("no preset named {0:?}")]
    NotFound(String),
}

/// Anything a control plane request can be rejected with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error(transparent)]
    Animation(#[from] AnimationError),
    #[error(transparent)]
    Preset(#[from] PresetError),
}

/// Fatal errors while bringing the installation up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("cannot load config {path}: {reason}")]
    Config { path: String, reason: String },
    #[error("cannot set up animations: {0}")]
    Animation(#[from] AnimationError),
    #[error("cannot apply startup state: {0}")]
    Control(#[from] ControlError),
    #[error("cannot set up OLA output: {0}")]
    Output(String),
    #[error("cannot set up MQTT: {0}")]
    Mqtt(String),
    #[error("cannot set up OSC: {0}")]
    Osc(String),
    #[error("cannot install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
