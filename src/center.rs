/*! Protocol center (C8).

The composition point: owns the UDP socket, the framer, the correlation
table, and the current mode, and exposes the narrow contract §4.8
specifies (`on_datagram`, `send_command`, `build_ack`). Grounded on
`examples/original_source/mode.py`'s `Base`/`Receive`/`Command` classes,
which wire the same pieces together around a blocking receive loop; the
ack-emission policy is unified here per the Open Question resolution in
`SPEC_FULL.md` (prefer this single policy uniformly, rather than the
source's two divergent code paths).
*/
use std::net::{SocketAddr, UdpSocket};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::catalogue::{self, Mode};
use crate::correlation::{Correlation, Outstanding};
use crate::error::{Error, Result};
use crate::frame::{self, Frame};
use crate::framer::StreamFramer;
use crate::record::DecodedMessage;
use crate::render;
use crate::{builder, parser};

/// Owns every piece of the receive/send pipeline; shared between the
/// receive thread and the command thread (§5).
pub struct Center {
    socket: UdpSocket,
    controller_addr: SocketAddr,
    controller_addr_field: u16,
    controller_id: String,
    mode: Mode,
    framer: Mutex<StreamFramer>,
    correlation: Correlation,
}

impl Center {
    /// Construct a center bound to `socket`, talking to `controller_addr`
    /// (the configured controller endpoint), addressing outbound frames
    /// with `controller_addr_field` (the frame-level `ADDR`, derived
    /// from the device id per §6) and rendering it as `controller_id`
    /// (`TCnnn`) in logs.
    #[must_use]
    pub fn new(
        socket: UdpSocket,
        controller_addr: SocketAddr,
        controller_addr_field: u16,
        controller_id: String,
        mode: Mode,
    ) -> Self {
        Center {
            socket,
            controller_addr,
            controller_addr_field,
            controller_id,
            mode,
            framer: Mutex::new(StreamFramer::new()),
            correlation: Correlation::new(),
        }
    }

    /// The correlation table, for the driver's `status` command.
    #[must_use]
    pub fn correlation(&self) -> &Correlation {
        &self.correlation
    }

    /// Feed one received UDP datagram through the framer and process
    /// every complete frame it yields, in arrival order (§5 ordering
    /// guarantee: ack-before-next-frame).
    pub fn on_datagram(&self, bytes: &[u8], from: SocketAddr) {
        let frames = self.framer.lock().feed(bytes);
        for raw in frames {
            self.process_frame(&raw, from);
        }
    }

    fn process_frame(&self, raw: &[u8], from: SocketAddr) {
        let decoded = match frame::decode(raw) {
            Ok(f) => f,
            Err(e) => {
                warn!("dropping frame: {e}");
                return;
            }
        };
        match decoded {
            Frame::ShortAck { seq, addr } => {
                match self.correlation.ack(seq) {
                    Some(info) => info!(
                        "ack received for seq=0x{seq:02X} addr=0x{addr:04X} ({})",
                        info.description
                    ),
                    None => debug!("ack for unknown seq=0x{seq:02X} addr=0x{addr:04X}"),
                }
            }
            Frame::Nak { seq, addr, err } => {
                warn!("nak received seq=0x{seq:02X} addr=0x{addr:04X} err=0x{err:02X}");
            }
            Frame::Message { seq, addr, payload } => {
                if payload.len() >= 2 {
                    let cmd_code = u16::from_be_bytes([payload[0], payload[1]]);
                    if let Some(entry) = catalogue::lookup(cmd_code) {
                        if !parser::validate_length(entry, payload.len()) {
                            warn!(
                                "dropping frame: {}",
                                Error::BadLength { len: payload.len() }
                            );
                            return;
                        }
                    }
                }
                let rec = parser::parse(seq, &self.controller_id, raw, &payload);
                self.log_if_enabled(&rec);
                if rec.needs_ack {
                    self.send_ack(seq, addr, from);
                }
            }
        }
    }

    fn log_if_enabled(&self, rec: &DecodedMessage) {
        let should_log = catalogue::lookup(rec.cmd_code)
            .map(|e| e.log_modes.contains(&self.mode))
            .unwrap_or(true);
        if should_log {
            for line in render::render(rec) {
                info!("{line}");
            }
        }
    }

    fn send_ack(&self, seq: u8, addr: u16, to: SocketAddr) {
        let ack = self.build_ack(seq, addr);
        match self.socket.send_to(&ack, to) {
            Ok(_) => debug!("ack sent seq=0x{seq:02X} addr=0x{addr:04X} to {to}"),
            Err(e) => warn!("ack send failed: {e}"),
        }
    }

    /// Delegate to the frame codec with an empty payload (§4.8).
    #[must_use]
    pub fn build_ack(&self, seq: u8, addr: u16) -> Vec<u8> {
        frame::encode(seq, addr, &[])
    }

    /// Allocate a sequence number, build a frame for `cmd_code` with
    /// `fields`, send it to the configured controller endpoint, register
    /// it in the correlation table, and log the outgoing frame. Returns
    /// the allocated sequence on success.
    pub fn send_command(
        &self,
        cmd_code: u16,
        fields: &[(String, crate::record::Value)],
        description: &str,
    ) -> Result<u8> {
        let payload = builder::build_payload(cmd_code, fields)?;
        let seq = self.correlation.next_seq();
        let frame = frame::encode(seq, self.controller_addr_field, &payload);

        self.socket
            .send_to(&frame, self.controller_addr)
            .map_err(|e| Error::SendFailed(e.to_string()))?;

        self.correlation.register(
            seq,
            Outstanding {
                cmd_code,
                description: description.to_string(),
                sent_at: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
                ack_received: false,
            },
        );
        info!(
            "sent 0x{cmd_code:04X} ({description}) seq=0x{seq:02X}: {}",
            frame.iter().map(|b| format!("{b:02X}")).collect::<String>()
        );
        Ok(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddr};

    fn bound_pair() -> (UdpSocket, SocketAddr) {
        let sock = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr = sock.local_addr().unwrap();
        (sock, addr)
    }

    #[test]
    fn on_datagram_acks_needs_ack_message() {
        let (controller_sock, controller_addr) = bound_pair();
        let (gateway_sock, _gateway_addr) = bound_pair();

        let center = Center::new(
            gateway_sock,
            controller_addr,
            3,
            "TC003".to_string(),
            Mode::Receive,
        );

        // 0x0F04 hardware-status report, needs_ack=true, status byte 0x00.
        let payload = vec![0x0F, 0x04, 0x00];
        let frame = frame::encode(1, 3, &payload);
        center.on_datagram(&frame, controller_addr);

        controller_sock
            .set_read_timeout(Some(std::time::Duration::from_millis(500)))
            .unwrap();
        let mut buf = [0u8; 64];
        let (n, _) = controller_sock.recv_from(&mut buf).unwrap();
        let ack = frame::decode(&buf[..n]).unwrap();
        assert!(matches!(ack, Frame::ShortAck { seq: 1, addr: 3 }));
    }

    #[test]
    fn bad_length_payload_is_dropped_without_ack() {
        let (controller_sock, controller_addr) = bound_pair();
        let (gateway_sock, _gateway_addr) = bound_pair();

        let center = Center::new(
            gateway_sock,
            controller_addr,
            3,
            "TC003".to_string(),
            Mode::Receive,
        );

        // 0x0F04 needs ExactLength(3) but this payload is missing the status byte.
        let payload = vec![0x0F, 0x04];
        let frame = frame::encode(1, 3, &payload);
        center.on_datagram(&frame, controller_addr);

        controller_sock
            .set_read_timeout(Some(std::time::Duration::from_millis(200)))
            .unwrap();
        let mut buf = [0u8; 64];
        assert!(controller_sock.recv_from(&mut buf).is_err());
    }

    #[test]
    fn build_ack_matches_short_ack_shape() {
        let (sock, addr) = bound_pair();
        let center = Center::new(sock, addr, 3, "TC003".to_string(), Mode::Receive);
        let ack = center.build_ack(5, 3);
        assert_eq!(ack, vec![0xAA, 0xDD, 0x05, 0x00, 0x03, 0x00, 0x08, 0x77]);
    }
}
