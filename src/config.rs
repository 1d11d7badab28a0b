use std::net::SocketAddr;
use std::path::Path;

use config_file::FromConfigFile;
use serde::Deserialize;

use crate::controller::DEFAULT_SPEED;
use crate::error::StartupError;
use crate::presets::Preset;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pixel_count: usize,
    pub ola_addr: SocketAddr,
    pub universe: u16,
    /// OSC control is disabled without a listen address.
    pub osc_listen_addr: Option<SocketAddr>,
    /// MQTT control is disabled without a broker.
    pub mqtt: Option<MqttConfig>,
    pub startup: StartupConfig,
    /// Longest the host loop sleeps between ticks, in milliseconds.
    pub idle_ms: u64,
    pub presets: Vec<PresetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub url: String,
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
    #[serde(default = "default_unique_id")]
    pub unique_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub animation: Option<String>,
    pub preset: Option<String>,
    pub speed: f32,
    pub running: bool,
}

#[derive(Debug, Deserialize)]
pub struct PresetConfig {
    pub name: String,
    pub colors: Vec<[u8; 3]>,
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}

fn default_unique_id() -> String {
    "discoball".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pixel_count: 60,
            ola_addr: SocketAddr::from(([127, 0, 0, 1], 7770)),
            universe: 0,
            osc_listen_addr: None,
            mqtt: None,
            startup: StartupConfig::default(),
            idle_ms: 10,
            presets: vec![],
        }
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        StartupConfig {
            animation: None,
            preset: None,
            speed: DEFAULT_SPEED,
            running: false,
        }
    }
}

impl MqttConfig {
    pub fn new(url: &str) -> MqttConfig {
        MqttConfig {
            url: url.to_string(),
            discovery_prefix: default_discovery_prefix(),
            unique_id: default_unique_id(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, StartupError> {
        Config::from_config_file(path).map_err(|err| StartupError::Config {
            path: path.display().to_string(),
            reason: format!("{:?}", err),
        })
    }

    pub fn presets(&self) -> Vec<Preset> {
        self.presets
            .iter()
            .map(|p| Preset::from_rgb8(&p.name, &p.colors))
            .collect()
    }
}
