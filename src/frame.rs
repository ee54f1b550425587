/*! Frame codec.

The wire carries two frame shapes (a third, NAK, is parseable but never
produced by this gateway): a *message* frame with a byte-stuffed
payload, and a fixed-length *short-ack*. Byte stuffing here mirrors the
`KISS_FEND`/`KISS_FESC` escaping the AX.25 `KissEncode`/`KissDecode`
blocks use, except a single control byte (`DLE`, 0xAA) is its own
escape: any `0xAA` in the logical payload is transmitted as two.

[kiss]: https://en.wikipedia.org/wiki/KISS_(amateur_radio_protocol)
 */
use crate::error::{Error, Result};

/// Escape/frame control bytes, fixed by the controller protocol.
pub const DLE: u8 = 0xAA;
/// Start of a message frame.
pub const STX: u8 = 0xBB;
/// End of a message frame's payload region.
pub const ETX: u8 = 0xCC;
/// Short acknowledgement frame type.
pub const ACK: u8 = 0xDD;
/// Negative acknowledgement frame type (parseable, never produced here).
pub const NAK: u8 = 0xEE;

/// A decoded frame, before any command-catalogue interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `DLE STX SEQ ADDR LEN <payload> DLE ETX CKS`, payload already destuffed.
    Message {
        /// Sequence number.
        seq: u8,
        /// Controller address.
        addr: u16,
        /// Destuffed logical payload.
        payload: Vec<u8>,
    },
    /// `DLE ACK SEQ ADDR LEN(=8) CKS`.
    ShortAck {
        /// Sequence number being acknowledged.
        seq: u8,
        /// Controller address.
        addr: u16,
    },
    /// `DLE NAK SEQ ADDR LEN(=9) ERR CKS`. Parseable, never encoded.
    Nak {
        /// Sequence number.
        seq: u8,
        /// Controller address.
        addr: u16,
        /// Error byte.
        err: u8,
    },
}

/// Duplicate every `DLE` (0xAA) byte in `payload`.
#[must_use]
pub fn stuff(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + payload.len() / 8 + 1);
    for &b in payload {
        out.push(b);
        if b == DLE {
            out.push(b);
        }
    }
    out
}

/// Collapse every `DLE DLE` pair in `stuffed` back to a single `DLE`.
#[must_use]
pub fn unstuff(stuffed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(stuffed.len());
    let mut i = 0;
    while i < stuffed.len() {
        if stuffed[i] == DLE && i + 1 < stuffed.len() && stuffed[i + 1] == DLE {
            out.push(DLE);
            i += 2;
        } else {
            out.push(stuffed[i]);
            i += 1;
        }
    }
    out
}

/// XOR checksum, seed 0.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Encode a message (or, if `payload` is empty, a short-ack).
#[must_use]
pub fn encode(seq: u8, addr: u16, payload: &[u8]) -> Vec<u8> {
    let [addr_hi, addr_lo] = addr.to_be_bytes();
    if payload.is_empty() {
        let mut header = vec![DLE, ACK, seq, addr_hi, addr_lo, 0x00, 0x08];
        let cks = checksum(&header);
        header.push(cks);
        return header;
    }

    let stuffed = stuff(payload);
    // 7 bytes of header (DLE STX SEQ ADDR(2) LEN(2)) + stuffed payload + DLE ETX CKS (3).
    let len = 10 + stuffed.len();
    let len = u16::try_from(len).expect("frame length fits in u16");
    let [len_hi, len_lo] = len.to_be_bytes();

    let mut frame = Vec::with_capacity(len as usize);
    frame.extend_from_slice(&[DLE, STX, seq, addr_hi, addr_lo, len_hi, len_lo]);
    frame.extend_from_slice(&stuffed);
    frame.extend_from_slice(&[DLE, ETX]);
    let cks = checksum(&frame);
    frame.push(cks);
    frame
}

/// Decode a single, already-delimited frame (see [`crate::framer`] for
/// extracting one from a growing byte stream).
pub fn decode(frame: &[u8]) -> Result<Frame> {
    if frame.len() < 3 {
        return Err(Error::ShortFrame {
            got: frame.len(),
            need: 3,
        });
    }
    if frame[0] != DLE {
        return Err(Error::BadSync);
    }
    let kind = frame[1];
    if !matches!(kind, STX | ACK | NAK) {
        return Err(Error::UnknownType(kind));
    }

    let last = frame.len() - 1;
    let want = checksum(&frame[..last]);
    let got = frame[last];
    if want != got {
        return Err(Error::BadChecksum { want, got });
    }

    let seq = frame[2];
    if frame.len() < 7 {
        return Err(Error::ShortFrame {
            got: frame.len(),
            need: 7,
        });
    }
    let addr = u16::from_be_bytes([frame[3], frame[4]]);

    match kind {
        ACK => Ok(Frame::ShortAck { seq, addr }),
        NAK => {
            if frame.len() < 9 {
                return Err(Error::ShortFrame {
                    got: frame.len(),
                    need: 9,
                });
            }
            Ok(Frame::Nak {
                seq,
                addr,
                err: frame[7],
            })
        }
        STX => {
            if frame.len() < 10 || frame[last - 2] != DLE || frame[last - 1] != ETX {
                return Err(Error::BadTrailer);
            }
            let stuffed = &frame[7..last - 2];
            let payload = unstuff(stuffed);
            Ok(Frame::Message { seq, addr, payload })
        }
        _ => unreachable!("kind already validated above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ack_round_trip() {
        let frame = encode(0x05, 0x0003, &[]);
        assert_eq!(frame, vec![0xAA, 0xDD, 0x05, 0x00, 0x03, 0x00, 0x08, 0x77]);
        match decode(&frame).unwrap() {
            Frame::ShortAck { seq, addr } => {
                assert_eq!(seq, 5);
                assert_eq!(addr, 3);
            }
            other => panic!("expected short-ack, got {other:?}"),
        }
    }

    #[test]
    fn nak_round_trip() {
        // DLE NAK SEQ ADDR(2) LEN(2)=9 ERR, CKS appended: 9 bytes total.
        let mut frame = vec![DLE, NAK, 0x05, 0x00, 0x03, 0x00, 0x09, 0x02];
        let cks = checksum(&frame);
        frame.push(cks);
        assert_eq!(frame.len(), 9);
        match decode(&frame).unwrap() {
            Frame::Nak { seq, addr, err } => {
                assert_eq!(seq, 5);
                assert_eq!(addr, 3);
                assert_eq!(err, 0x02);
            }
            other => panic!("expected NAK, got {other:?}"),
        }
    }

    #[test]
    fn stuffing_lone_dle() {
        let payload = [0x5F, 0x10, 0xAA, 0x3C];
        let frame = encode(1, 3, &payload);
        // DLE STX SEQ ADDR(2) LEN(2) = 7 header bytes, then stuffed payload.
        assert_eq!(&frame[7..7 + 5], &[0x5F, 0x10, 0xAA, 0xAA, 0x3C]);
        match decode(&frame).unwrap() {
            Frame::Message {
                seq, addr, payload, ..
            } => {
                assert_eq!(seq, 1);
                assert_eq!(addr, 3);
                assert_eq!(payload, vec![0x5F, 0x10, 0xAA, 0x3C]);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn stuff_unstuff_round_trip_runs_of_dle() {
        for run in 1..=5 {
            let mut payload = vec![0x01, 0x02];
            payload.extend(std::iter::repeat_n(DLE, run));
            payload.push(0x09);
            let stuffed = stuff(&payload);
            assert_eq!(unstuff(&stuffed), payload);
        }
    }

    #[test]
    fn stuff_unstuff_no_dle() {
        let payload = [1, 2, 3, 4, 5];
        assert_eq!(unstuff(&stuff(&payload)), payload);
    }

    #[test]
    fn decode_bad_checksum() {
        let mut frame = encode(1, 1, &[0x5F, 0x40]);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        assert!(matches!(decode(&frame), Err(Error::BadChecksum { .. })));
    }

    #[test]
    fn decode_bad_trailer() {
        let mut frame = encode(1, 1, &[0x5F, 0x40]);
        let last = frame.len() - 1;
        frame[last - 1] = 0x00; // corrupt ETX
        // Recompute checksum over the corrupted bytes so we hit BadTrailer, not BadChecksum.
        let cks = checksum(&frame[..last]);
        frame[last] = cks;
        assert!(matches!(decode(&frame), Err(Error::BadTrailer)));
    }

    #[test]
    fn decode_rejects_short() {
        assert!(matches!(decode(&[0xAA]), Err(Error::ShortFrame { .. })));
    }

    #[test]
    fn decode_unknown_type() {
        let mut frame = vec![DLE, 0x11, 0, 0, 0, 0, 0];
        let cks = checksum(&frame);
        frame.push(cks);
        assert!(matches!(decode(&frame), Err(Error::UnknownType(0x11))));
    }
}
