use std::{
    sync::{mpsc, Arc, Mutex},
    time::Duration,
};

use mqtt::{Message, Receiver};
use paho_mqtt as mqtt;

use crate::config::MqttConfig;
use crate::controls::{Command, Controls};

pub struct MqttClient<S: Session = mqtt::Client> {
    session: S,
    unique_id: String,
    topics: Topics,
    controls: Arc<Mutex<Controls>>,
}

struct Topics {
    state: String,
    state_set: String,
    animations: String,
    discovery: String,
}

impl Topics {
    fn new(discovery_prefix: &str, unique_id: &str) -> Topics {
        Topics {
            state: format!("discoball/{unique_id}/state"),
            state_set: format!("discoball/{unique_id}/state/set"),
            animations: format!("discoball/{unique_id}/animations"),
            discovery: format!("{discovery_prefix}/light/{unique_id}/config"),
        }
    }
}

/// Translates a Home Assistant JSON schema command into control requests.
///
/// Preset and effect are applied before the power state, so "switch on with
/// effect X" never shows a frame of the previous effect.
fn commands_from_json(json: &json::JsonValue) -> Vec<Command> {
    let mut commands = vec![];

    if json.has_key("preset") {
        match json["preset"].as_str() {
            Some(preset) => commands.push(Command::Preset(preset.to_string())),
            None => log::warn!("Unexpected preset value: {}", json["preset"]),
        }
    }

    if json.has_key("effect") {
        match json["effect"].as_str() {
            Some(effect) => commands.push(Command::effect(effect)),
            None => log::warn!("Unexpected effect value: {}", json["effect"]),
        }
    }

    if json.has_key("speed") {
        match json["speed"].as_f32() {
            Some(speed) => commands.push(Command::Speed(speed)),
            None => log::warn!("Unexpected speed value: {}", json["speed"]),
        }
    }

    if json.has_key("state") {
        if json["state"] == "ON" {
            commands.push(Command::Start);
        } else if json["state"] == "OFF" {
            commands.push(Command::Stop);
        } else {
            log::warn!("Unexpected state value: {}", json["state"]);
        }
    }

    commands
}

fn state_payload(controls: &Controls) -> json::JsonValue {
    json::object! {
        available: "online",
        state: if controls.animations.is_running() { "ON" } else { "OFF" },
        effect: controls.effect_name(),
        speed: controls.animations.speed(),
        preset: controls.presets.active_name(),
    }
}

fn animations_payload(controls: &Controls) -> json::JsonValue {
    let animations: Vec<json::JsonValue> = controls
        .animations
        .registry()
        .all()
        .iter()
        .map(|descriptor| {
            json::object! {
                name: descriptor.name(),
                ignores_presets: descriptor.ignores_presets(),
            }
        })
        .collect();

    json::object! {
        animations: animations,
        presets: controls.presets.names(),
    }
}

/// The broker operations the client relies on.
pub trait Session {
    fn is_connected(&self) -> bool;
    fn reconnect(&self) -> Result<(), String>;
    fn subscribe(&self, topic: &str) -> Result<(), String>;
    fn publish(&self, msg: Message) -> Result<(), String>;
    fn disconnect(&self) -> Result<(), String>;
}

impl Session for mqtt::Client {
    fn is_connected(&self) -> bool {
        mqtt::Client::is_connected(self)
    }

    fn reconnect(&self) -> Result<(), String> {
        mqtt::Client::reconnect(self)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }

    fn subscribe(&self, topic: &str) -> Result<(), String> {
        mqtt::Client::subscribe(self, topic, 0)
            .map(|_| ())
            .map_err(|err| err.to_string())
    }

    fn publish(&self, msg: Message) -> Result<(), String> {
        mqtt::Client::publish(self, msg).map_err(|err| err.to_string())
    }

    fn disconnect(&self) -> Result<(), String> {
        mqtt::Client::disconnect(self, None).map_err(|err| err.to_string())
    }
}

fn make_lwt_message(topic: &str) -> mqtt::Message {
    let payload = json::object! {
        available: "offline"
    };

    return mqtt::Message::new_retained(topic, json::stringify(payload), 0);
}

impl MqttClient {
    /// Connects to the broker. The receiver yields incoming commands and `None` on connection loss.
    pub fn connect(
        config: &MqttConfig,
        controls: Arc<Mutex<Controls>>,
    ) -> Result<(MqttClient, Receiver<Option<Message>>), String> {
        let topics = Topics::new(&config.discovery_prefix, &config.unique_id);

        let client = match mqtt::Client::new(config.url.as_str()) {
            Ok(client) => client,
            Err(err) => {
                return Err(format!("{:?}", err));
            }
        };

        let conn_opts = mqtt::ConnectOptionsBuilder::new()
            .keep_alive_interval(Duration::from_secs(20))
            .clean_session(true)
            .will_message(make_lwt_message(&topics.state))
            .finalize();

        if let Err(err) = client.connect(conn_opts) {
            return Err(format!("Cannot connect to {}: {:?}", config.url, err));
        }

        log::info!("Connected to broker at {}", config.url);

        let receiver = client.start_consuming();
        let mqtt_client = MqttClient {
            session: client,
            unique_id: config.unique_id.to_string(),
            topics,
            controls,
        };

        mqtt_client.subscribe()?;
        mqtt_client.announce();
        Ok((mqtt_client, receiver))
    }
}

impl<S: Session> MqttClient<S> {
    fn subscribe(&self) -> Result<(), String> {
        self.session.subscribe(&self.topics.state_set).map_err(|err| {
            format!(
                "Failed to subscribe to topic {}: {}",
                &self.topics.state_set, err
            )
        })
    }

    /// Publishes everything retained. The broker may have lost it together with the session.
    fn announce(&self) {
        self.publish_discovery();
        self.publish_animations();
        self.publish_state();
    }

    fn ensure_connected(&self) -> bool {
        if self.session.is_connected() {
            return true;
        }

        if let Err(err) = self.session.reconnect() {
            log::warn!("Reconnection failed: {err}");
            return false;
        }

        // Clean session: the subscription is gone after a reconnect
        if let Err(err) = self.subscribe() {
            log::warn!("{err}");
            return false;
        }
        log::info!("Reconnected to broker");
        self.announce();
        true
    }

    fn publish_retained(&self, topic: &str, payload: json::JsonValue) {
        if !self.ensure_connected() {
            return;
        }

        let payload_str = json::stringify(payload);
        let msg = mqtt::Message::new_retained(topic, payload_str.clone(), 0);
        log::info!("Publishing {}: {}", topic, &payload_str);
        if let Err(err) = self.session.publish(msg) {
            log::warn!("Publishing to {topic} failed: {err}");
        }
    }

    fn publish_discovery(&self) {
        let effect_list = self.controls.lock().unwrap().effect_list();
        let payload = json::object! {
            schema: "json",
            device: {
                identifiers: self.unique_id.to_string(),
                model: "discoball",
                name: "discoball",
            },
            unique_id: self.unique_id.to_string(),
            name: "discoball",

            effect: true,
            effect_list: effect_list,

            availability_topic: self.topics.state.to_string(),
            availability_template: "{{ value_json.available }}",

            state_topic: self.topics.state.to_string(),
            command_topic: self.topics.state_set.to_string(),
        };

        self.publish_retained(&self.topics.discovery, payload);
    }

    /// Announces the available animations and presets for clients that do not speak Home Assistant.
    fn publish_animations(&self) {
        let payload = animations_payload(&self.controls.lock().unwrap());
        self.publish_retained(&self.topics.animations, payload);
    }

    fn publish_state(&self) {
        let payload = state_payload(&self.controls.lock().unwrap());
        self.publish_retained(&self.topics.state, payload);
    }

    /// Handles incoming commands until the connection is gone for good.
    pub fn run(&self, receiver: Receiver<Option<Message>>) {
        loop {
            match receiver.recv() {
                Ok(msg) => {
                    if let Some(msg) = msg {
                        self.handle_message(msg);
                    } else {
                        log::warn!("Lost connection to broker");
                        self.ensure_connected();
                    }
                }
                Err(err) => {
                    log::error!("MQTT control stopped, error receiving messages: {err}");
                    break;
                }
            };
        }
    }

    /// Keeps the state topic current, no matter which control plane changed something.
    pub fn publish_changes(&self, changes: mpsc::Receiver<()>) {
        while changes.recv().is_ok() {
            // One publish for a burst of commands
            while changes.try_recv().is_ok() {}
            self.publish_state();
        }
    }

    fn handle_message(&self, msg: Message) {
        let json = match json::parse(&msg.payload_str()) {
            Ok(json) => json,
            Err(err) => {
                log::warn!(
                    "Failed to parse message payload from {}: {}",
                    msg.topic(),
                    err
                );
                return;
            }
        };

        log::info!(
            "Received {}: {}",
            msg.topic(),
            json::stringify(json.clone())
        );

        let commands = commands_from_json(&json);
        self.controls.lock().unwrap().apply_all(commands);
    }
}

impl<S: Session> Drop for MqttClient<S> {
    fn drop(&mut self) {
        if let Err(err) = self.session.disconnect() {
            // We don't really care about errors here, but let's make rustc happy.
            log::error!("{:?}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::tests::controls;

    #[derive(Default)]
    struct RecordingSession {
        connected: Mutex<bool>,
        subscriptions: Mutex<Vec<String>>,
        published: Mutex<Vec<String>>,
    }

    impl Session for RecordingSession {
        fn is_connected(&self) -> bool {
            *self.connected.lock().unwrap()
        }

        fn reconnect(&self) -> Result<(), String> {
            *self.connected.lock().unwrap() = true;
            Ok(())
        }

        fn subscribe(&self, topic: &str) -> Result<(), String> {
            self.subscriptions.lock().unwrap().push(topic.to_string());
            Ok(())
        }

        fn publish(&self, msg: Message) -> Result<(), String> {
            self.published.lock().unwrap().push(msg.topic().to_string());
            Ok(())
        }

        fn disconnect(&self) -> Result<(), String> {
            Ok(())
        }
    }

    fn client(connected: bool) -> MqttClient<RecordingSession> {
        MqttClient {
            session: RecordingSession {
                connected: Mutex::new(connected),
                ..Default::default()
            },
            unique_id: "ball-1".to_string(),
            topics: Topics::new("homeassistant", "ball-1"),
            controls: Arc::new(Mutex::new(controls())),
        }
    }

    #[test]
    fn reconnect_resubscribes_and_republishes() {
        let client = client(false);

        assert!(client.ensure_connected());

        assert_eq!(
            *client.session.subscriptions.lock().unwrap(),
            vec!["discoball/ball-1/state/set"]
        );
        assert_eq!(
            *client.session.published.lock().unwrap(),
            vec![
                "homeassistant/light/ball-1/config",
                "discoball/ball-1/animations",
                "discoball/ball-1/state",
            ]
        );
    }

    #[test]
    fn connected_session_is_left_alone() {
        let client = client(true);

        client.publish_state();

        assert!(client.session.subscriptions.lock().unwrap().is_empty());
        assert_eq!(
            *client.session.published.lock().unwrap(),
            vec!["discoball/ball-1/state"]
        );
    }

    #[test]
    fn bursts_of_changes_publish_state_once() {
        let client = client(true);
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            tx.send(()).unwrap();
        }
        drop(tx);

        client.publish_changes(rx);

        assert_eq!(client.session.published.lock().unwrap().len(), 1);
    }

    #[test]
    fn commands_reach_the_controls() {
        let client = client(true);
        let msg = Message::new(
            "discoball/ball-1/state/set",
            r#"{"state": "ON", "effect": "breathe"}"#,
            0,
        );

        client.handle_message(msg);

        let controls = client.controls.lock().unwrap();
        assert_eq!(controls.effect_name(), "breathe");
        assert!(controls.animations.is_running());
    }

    #[test]
    fn topics_follow_unique_id() {
        let topics = Topics::new("homeassistant", "ball-1");
        assert_eq!(topics.state, "discoball/ball-1/state");
        assert_eq!(topics.state_set, "discoball/ball-1/state/set");
        assert_eq!(topics.animations, "discoball/ball-1/animations");
        assert_eq!(topics.discovery, "homeassistant/light/ball-1/config");
    }

    #[test]
    fn full_command_in_apply_order() {
        let json = json::parse(
            r#"{"state": "ON", "effect": "fire", "speed": 2, "preset": "police", "brightness": 80}"#,
        )
        .unwrap();

        assert_eq!(
            commands_from_json(&json),
            vec![
                Command::Preset("police".to_string()),
                Command::Effect(Some("fire".to_string())),
                Command::Speed(2.0),
                Command::Start,
            ]
        );
    }

    #[test]
    fn none_effect_and_off() {
        let json = json::parse(r#"{"state": "OFF", "effect": "None"}"#).unwrap();
        assert_eq!(
            commands_from_json(&json),
            vec![Command::Effect(None), Command::Stop]
        );
    }

    #[test]
    fn malformed_values_are_skipped() {
        let json = json::parse(r#"{"state": "MAYBE", "effect": 3, "speed": "fast"}"#).unwrap();
        assert!(commands_from_json(&json).is_empty());
    }

    #[test]
    fn state_reflects_controls() {
        let mut controls = controls();
        controls
            .apply_all(vec![Command::effect("rainbow"), Command::Speed(0.5), Command::Start]);

        let state = state_payload(&controls);
        assert_eq!(state["state"], "ON");
        assert_eq!(state["effect"], "rainbow");
        assert_eq!(state["speed"].as_f32(), Some(0.5));
        assert_eq!(state["preset"], "warm");

        controls.apply_all(vec![Command::effect("None"), Command::Stop]);
        let state = state_payload(&controls);
        assert_eq!(state["state"], "OFF");
        assert_eq!(state["effect"], "None");
    }

    #[test]
    fn animations_are_announced_in_order() {
        let payload = animations_payload(&controls());
        let animations = &payload["animations"];

        assert_eq!(animations.len(), 8);
        assert_eq!(animations[0]["name"], "solid");
        assert_eq!(animations[0]["ignores_presets"], false);
        assert_eq!(animations[6]["name"], "fire");
        assert_eq!(animations[6]["ignores_presets"], true);
        assert_eq!(payload["presets"][1], "police");
    }
}
