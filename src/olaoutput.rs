use std::{
    net::{SocketAddr, UdpSocket},
    str::FromStr,
};

use palette::Srgb;
use rosc::{encoder, OscMessage, OscPacket, OscType};

use crate::leds::LedOutput;

const DMX_UNIVERSE_SIZE: usize = 512;
const CHANNELS_PER_PIXEL: usize = 3;

/// Sends frames to OLA's OSC plugin, one RGB triple per pixel in a single universe.
pub struct OlaOutput {
    sock: UdpSocket,
    target_addr: SocketAddr,
    universe_addr: String,
    pixel_count: usize,
    buffer: Vec<u8>,
}

impl OlaOutput {
    pub fn new(target_addr: SocketAddr, universe: u16, pixel_count: usize) -> Result<Self, String> {
        if pixel_count * CHANNELS_PER_PIXEL > DMX_UNIVERSE_SIZE {
            return Err(format!(
                "{pixel_count} pixels do not fit into one DMX universe (max {})",
                DMX_UNIVERSE_SIZE / CHANNELS_PER_PIXEL
            ));
        }

        let our_addr = SocketAddr::from_str("0.0.0.0:0").map_err(|err| err.to_string())?;
        let sock = match UdpSocket::bind(our_addr) {
            Ok(sock) => sock,
            Err(error) => return Err(error.to_string()),
        };

        log::info!("Sending {pixel_count} pixels to OLA at {target_addr}, universe {universe}");

        Ok(OlaOutput {
            sock,
            target_addr,
            universe_addr: format!("/dmx/universe/{universe}"),
            pixel_count,
            buffer: vec![0; pixel_count * CHANNELS_PER_PIXEL],
        })
    }

    pub fn blackout(&mut self) {
        self.buffer.fill(0);
        self.show();
    }

    fn encode_frame(&self) -> Result<Vec<u8>, rosc::OscError> {
        encoder::encode(&OscPacket::Message(OscMessage {
            addr: self.universe_addr.clone(),
            args: vec![OscType::Blob(self.buffer.clone())],
        }))
    }
}

fn to_dmx(color: palette::LinSrgb) -> [u8; 3] {
    let encoded: Srgb<u8> = Srgb::from_linear(color);
    [encoded.red, encoded.green, encoded.blue]
}

impl LedOutput for OlaOutput {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn set(&mut self, index: usize, color: palette::LinSrgb) {
        if index >= self.pixel_count {
            return;
        }

        let start = index * CHANNELS_PER_PIXEL;
        self.buffer[start..start + CHANNELS_PER_PIXEL].copy_from_slice(&to_dmx(color));
    }

    fn show(&mut self) {
        let msg_buf = match self.encode_frame() {
            Ok(msg_buf) => msg_buf,
            Err(err) => {
                log::warn!("Cannot encode DMX frame: {err:?}");
                return;
            }
        };

        if let Err(err) = self.sock.send_to(&msg_buf, self.target_addr) {
            log::warn!("Cannot send DMX frame to {}: {err}", self.target_addr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_output(pixel_count: usize) -> OlaOutput {
        let target = SocketAddr::from_str("127.0.0.1:9").unwrap();
        OlaOutput::new(target, 0, pixel_count).unwrap()
    }

    #[test]
    fn rejects_strips_larger_than_a_universe() {
        let target = SocketAddr::from_str("127.0.0.1:9").unwrap();
        assert!(OlaOutput::new(target, 0, 171).is_err());
        assert!(OlaOutput::new(target, 0, 170).is_ok());
    }

    #[test]
    fn set_writes_rgb_triples() {
        let mut ola = local_output(3);
        ola.set(1, palette::LinSrgb::new(1.0, 0.0, 1.0));
        ola.set(5, palette::LinSrgb::new(1.0, 1.0, 1.0));

        assert_eq!(ola.buffer, vec![0, 0, 0, 255, 0, 255, 0, 0, 0]);
    }

    #[test]
    fn frame_is_addressed_to_universe() {
        let target = SocketAddr::from_str("127.0.0.1:9").unwrap();
        let mut ola = OlaOutput::new(target, 2, 2).unwrap();
        ola.fill(palette::LinSrgb::new(1.0, 1.0, 1.0));

        let packet = rosc::decoder::decode(&ola.encode_frame().unwrap()).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/dmx/universe/2");
                assert_eq!(msg.args, vec![OscType::Blob(vec![255; 6])]);
            }
            OscPacket::Bundle(_) => panic!("expected a message"),
        }
    }
}
