use std::{
    net::{SocketAddr, UdpSocket},
    sync::{Arc, Mutex},
};

use rosc::{decoder, OscMessage, OscPacket, OscType};

use crate::controls::{Command, Controls};

/// Control surface endpoint, e.g. for TouchOSC layouts.
///
/// Understood addresses:
/// - `/animation/effect <name>` and `/effect/<name>` select an animation, `None` deselects
/// - `/animation/start`, `/animation/stop`, `/animation/running <0|1>`
/// - `/animation/speed <float>`
/// - `/preset <name>` and `/preset/<name>`
pub struct OscReceiver {
    sock: UdpSocket,
    controls: Arc<Mutex<Controls>>,
}

impl OscReceiver {
    pub fn new(listen_addr: SocketAddr, controls: Arc<Mutex<Controls>>) -> Result<Self, String> {
        let sock = match UdpSocket::bind(listen_addr) {
            Ok(sock) => sock,
            Err(error) => return Err(error.to_string()),
        };

        log::info!("Listening for OSC on {listen_addr}");
        Ok(OscReceiver { sock, controls })
    }

    pub fn run(&self) {
        let mut buf = [0u8; rosc::decoder::MTU];

        loop {
            match self.sock.recv_from(&mut buf) {
                Ok((size, addr)) => {
                    log::debug!("Received packet with size {} from: {}", size, addr);
                    match decoder::decode(&buf[..size]) {
                        Ok(packet) => self.handle_packet(packet),
                        Err(err) => log::warn!("Cannot decode OSC packet from {addr}: {err:?}"),
                    }
                }
                Err(e) => {
                    log::error!("Error receiving from socket: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_packet(&self, packet: OscPacket) {
        match packet {
            OscPacket::Message(msg) => self.handle_message(&msg),
            OscPacket::Bundle(bundle) => {
                for packet in bundle.content {
                    self.handle_packet(packet);
                }
            }
        }
    }

    fn handle_message(&self, msg: &OscMessage) {
        match command_from_message(msg) {
            Ok(Some(command)) => {
                log::info!("OSC {}: {:?}", msg.addr, command);
                self.controls.lock().unwrap().apply_all(vec![command]);
            }
            Ok(None) => {
                log::debug!("Ignoring OSC address: {}", msg.addr);
                log::debug!("OSC arguments: {:?}", msg.args);
            }
            Err(msg) => log::warn!("{}", msg),
        }
    }
}

/// `Ok(None)` for addresses this installation does not handle.
fn command_from_message(msg: &OscMessage) -> Result<Option<Command>, String> {
    let command = match msg.addr.as_str() {
        "/animation/effect" => Command::effect(&handle_string_message(msg)?),
        "/animation/start" => Command::Start,
        "/animation/stop" => Command::Stop,
        "/animation/running" => {
            if handle_float_message(msg)? > 0.5 {
                Command::Start
            } else {
                Command::Stop
            }
        }
        "/animation/speed" => Command::Speed(handle_float_message(msg)?),
        "/preset" => Command::Preset(handle_string_message(msg)?),
        addr => {
            if let Some(name) = addr.strip_prefix("/effect/") {
                Command::effect(name)
            } else if let Some(name) = addr.strip_prefix("/preset/") {
                Command::Preset(name.to_string())
            } else {
                return Ok(None);
            }
        }
    };

    Ok(Some(command))
}

fn extract_float_argument(msg: &OscMessage, arg: &OscType) -> Result<f32, String> {
    match arg {
        OscType::Float(value) => Ok(*value),
        OscType::Double(value) => Ok(*value as f32),
        OscType::Int(value) => Ok(*value as f32),
        _ => Err(format!(
            "{} Unexpected OSC parameter type: {:?}",
            msg.addr, arg
        )),
    }
}

fn handle_float_message(msg: &OscMessage) -> Result<f32, String> {
    if let Some(arg) = msg.args.first() {
        return extract_float_argument(msg, arg);
    } else {
        return Err(format!("{} Missing OSC parameter: float", msg.addr));
    }
}

fn handle_string_message(msg: &OscMessage) -> Result<String, String> {
    match msg.args.first() {
        Some(OscType::String(value)) => Ok(value.clone()),
        Some(arg) => Err(format!(
            "{} Unexpected OSC parameter type: {:?}",
            msg.addr, arg
        )),
        None => Err(format!("{} Missing OSC parameter: string", msg.addr)),
    }
}
