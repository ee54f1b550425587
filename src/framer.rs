/*! Stream framer.

Accumulates bytes from successive UDP datagrams into a single growing
buffer and drains whole frames out of it, tolerant of garbage prefixes
and of frames arbitrarily split across datagram boundaries. This plays
the same role for the byte-oriented controller protocol that an
HDLC deframer's bit-level state machine plays for HDLC: find a sync
pattern, determine how much more is needed, and either yield a frame or
wait for more input.

Unlike the bit-oriented HDLC case, the wire header here carries its own
length field once the `DLE STX` sync is found, so the framer never has
to guess at a frame boundary; it only has to wait for enough bytes.
*/
use log::{debug, trace};

use crate::frame::{ACK, DLE, NAK, STX};

/// Accumulates datagram bytes and yields complete, still-encoded frames.
#[derive(Debug, Default)]
pub struct StreamFramer {
    buf: Vec<u8>,
    noise_bytes: u64,
    frames_yielded: u64,
}

impl StreamFramer {
    /// Create an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly received bytes in and drain every complete frame now
    /// available. Partial tails are retained for the next call.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(data);
        let mut out = Vec::new();
        while self.buf.len() >= 3 {
            let Some(i) = self.find_sync() else {
                trace!("framer: no sync found, dropping {} bytes", self.buf.len());
                self.noise_bytes += self.buf.len() as u64;
                self.buf.clear();
                break;
            };
            if i > 0 {
                self.noise_bytes += i as u64;
                self.buf.drain(..i);
            }

            let Some(total) = self.frame_total_len() else {
                // Header not fully arrived yet; wait for more bytes.
                break;
            };
            if self.buf.len() < total {
                break;
            }
            let frame: Vec<u8> = self.buf.drain(..total).collect();
            debug!("framer: yielded {} byte frame", frame.len());
            self.frames_yielded += 1;
            out.push(frame);
        }
        out
    }

    /// First index `i` with `buf[i] == DLE` and `buf[i+1]` a known type byte.
    fn find_sync(&self) -> Option<usize> {
        if self.buf.len() < 2 {
            return None;
        }
        (0..self.buf.len() - 1)
            .find(|&i| self.buf[i] == DLE && matches!(self.buf[i + 1], STX | ACK | NAK))
    }

    /// Total length of the frame starting at `buf[0]`, or `None` if the
    /// header isn't fully buffered yet (only possible for STX frames,
    /// whose length lives in bytes 5..7).
    fn frame_total_len(&self) -> Option<usize> {
        match self.buf[1] {
            STX => {
                if self.buf.len() < 7 {
                    return None;
                }
                Some(u16::from_be_bytes([self.buf[5], self.buf[6]]) as usize)
            }
            ACK => Some(8),
            NAK => Some(9),
            _ => unreachable!("find_sync only matches known type bytes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode;

    #[test]
    fn single_frame_one_shot() {
        let frame = encode(1, 3, &[0x5F, 0x40]);
        let mut f = StreamFramer::new();
        let out = f.feed(&frame);
        assert_eq!(out, vec![frame]);
    }

    #[test]
    fn split_across_datagrams() {
        let frame = encode(7, 3, &[0x5F, 0x10, 0x03, 0x3C]);
        assert!(frame.len() > 20);
        let mut f = StreamFramer::new();
        assert!(f.feed(&frame[..20]).is_empty());
        let out = f.feed(&frame[20..]);
        assert_eq!(out, vec![frame]);
    }

    #[test]
    fn garbage_prefix_is_dropped() {
        let frame = encode(1, 3, &[0x5F, 0x40]);
        let mut noisy = vec![0x00, 0x11, 0x22, DLE, 0x99]; // DLE not followed by a known type
        noisy.extend_from_slice(&frame);
        let mut f = StreamFramer::new();
        let out = f.feed(&noisy);
        assert_eq!(out, vec![frame]);
    }

    #[test]
    fn multiple_frames_interleaved_with_garbage() {
        let a = encode(1, 3, &[0x5F, 0x40]);
        let b = encode(2, 3, &[]); // short-ack
        let c = encode(3, 3, &[0x5F, 0x18, 0x01]);
        let mut stream = Vec::new();
        stream.extend_from_slice(&a);
        stream.extend_from_slice(&[0xDE, 0xAD]);
        stream.extend_from_slice(&b);
        stream.extend_from_slice(&c);
        let mut f = StreamFramer::new();
        let out = f.feed(&stream);
        assert_eq!(out, vec![a, b, c]);
    }

    #[test]
    fn no_sync_drops_everything() {
        let mut f = StreamFramer::new();
        let out = f.feed(&[0x01, 0x02, 0x03, 0x04]);
        assert!(out.is_empty());
        assert!(f.buf.is_empty());
    }
}
