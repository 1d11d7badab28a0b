pub(crate) mod config;
pub(crate) mod controller;
pub(crate) mod controls;
pub(crate) mod discoball;
pub(crate) mod effects;
pub(crate) mod error;
pub(crate) mod intervaltimer;
pub(crate) mod leds;
pub(crate) mod mqtt;
pub(crate) mod olaoutput;
pub(crate) mod osc;
pub(crate) mod presets;
pub(crate) mod registry;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use config::{Config, MqttConfig};
use controller::AnimationController;
use controls::{Command, Controls};
use discoball::Discoball;
use error::StartupError;
use olaoutput::OlaOutput;
use presets::PresetStore;

use crate::mqtt::MqttClient;
use crate::osc::OscReceiver;

const DEFAULT_CONFIG_PATH: &str = "discoball.toml";

#[derive(Parser)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// MQTT broker to connect to, overrides the config file
    #[arg(long, value_name = "URL")]
    mqtt_url: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Cli) -> Result<Config, StartupError> {
    let mut config = match args.config.as_deref() {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => {
            log::info!("No {DEFAULT_CONFIG_PATH} found, using defaults");
            Config::default()
        }
    };

    if let Some(url) = args.mqtt_url.as_deref() {
        config.mqtt = match config.mqtt {
            Some(mqtt) => Some(MqttConfig {
                url: url.to_string(),
                ..mqtt
            }),
            None => Some(MqttConfig::new(url)),
        };
    }

    Ok(config)
}

fn create_controls(config: &Config) -> Result<Controls, StartupError> {
    let registry = effects::builtin_registry()?;
    log::info!("Animations: {}", registry.names().join(", "));

    let mut controls = Controls::new(
        AnimationController::new(registry),
        PresetStore::new(config.presets()),
    );

    let startup = &config.startup;
    let mut commands = vec![Command::Speed(startup.speed)];
    if let Some(preset) = startup.preset.as_deref() {
        commands.push(Command::Preset(preset.to_string()));
    }
    if let Some(animation) = startup.animation.as_deref() {
        commands.push(Command::effect(animation));
    }
    if startup.running {
        commands.push(Command::Start);
    }
    for command in commands {
        controls.apply(command)?;
    }

    Ok(controls)
}

fn spawn_control_planes(
    config: &Config,
    controls: &Arc<Mutex<Controls>>,
) -> Result<(), StartupError> {
    if let Some(mqtt_config) = config.mqtt.as_ref() {
        let changes = controls.lock().unwrap().watch();
        let (mqtt_client, messages) =
            MqttClient::connect(mqtt_config, Arc::clone(controls)).map_err(StartupError::Mqtt)?;
        let mqtt_client = Arc::new(mqtt_client);

        let state_client = Arc::clone(&mqtt_client);
        thread::Builder::new()
            .name("MQTT state".to_string())
            .spawn(move || {
                state_client.publish_changes(changes);
            })?;
        thread::Builder::new()
            .name("MQTT".to_string())
            .spawn(move || {
                mqtt_client.run(messages);
            })?;
    }

    if let Some(listen_addr) = config.osc_listen_addr {
        let osc_receiver =
            OscReceiver::new(listen_addr, Arc::clone(controls)).map_err(StartupError::Osc)?;
        thread::Builder::new()
            .name("OSC".to_string())
            .spawn(move || {
                osc_receiver.run();
            })?;
    }

    Ok(())
}

fn run(args: Cli) -> Result<(), StartupError> {
    let config = load_config(&args)?;
    let controls = Arc::new(Mutex::new(create_controls(&config)?));

    let ola = OlaOutput::new(config.ola_addr, config.universe, config.pixel_count)
        .map_err(StartupError::Output)?;

    spawn_control_planes(&config, &controls)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || shutdown_flag.store(true, Ordering::Relaxed))?;

    let discoball = Discoball::new(
        controls,
        ola,
        Duration::from_millis(config.idle_ms),
        shutdown,
    );
    let mut ola = discoball.run();
    ola.blackout();

    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("discoball").chain(args.iter().copied()))
    }

    #[test]
    fn missing_explicit_config_is_fatal() {
        let args = cli(&["--config", "/nonexistent/discoball.toml"]);
        assert!(matches!(
            load_config(&args),
            Err(StartupError::Config { .. })
        ));
    }

    #[test]
    fn mqtt_url_overrides_broker_only() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        std::io::Write::write_all(
            &mut file,
            b"[mqtt]\nurl = \"tcp://old:1883\"\nunique_id = \"ball-2\"\n",
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let args = cli(&["--config", path, "--mqtt-url", "tcp://new:1883"]);
        let mqtt = load_config(&args).unwrap().mqtt.unwrap();
        assert_eq!(mqtt.url, "tcp://new:1883");
        assert_eq!(mqtt.unique_id, "ball-2");
    }

    #[test]
    fn startup_state_is_applied() {
        let mut config = Config::default();
        config.startup.animation = Some("fire".to_string());
        config.startup.speed = 2.0;
        config.startup.running = true;

        let controls = create_controls(&config).unwrap();
        assert_eq!(controls.effect_name(), "fire");
        assert_eq!(controls.animations.speed(), 2.0);
        assert!(controls.animations.is_running());
        assert_eq!(controls.presets.active_name(), "white");
    }

    #[test]
    fn unknown_startup_animation_is_fatal() {
        let mut config = Config::default();
        config.startup.animation = Some("strobe".to_string());
        assert!(matches!(
            create_controls(&config),
            Err(StartupError::Control(_))
        ));
    }
}
