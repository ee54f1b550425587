/*! Decoded message records and their semantically-typed field values.

Grounded on `examples/original_source/1592_測試程式/utils/tc_protocol.py`'s
per-command `process_XXXX_packet` methods, which build up a Python dict of
already-typed values (ints, lists of dicts, lists of strings) rather than
raw bytes. [`Value`] is the static-typed equivalent of that dict's value
type; [`DecodedMessage`] is the equivalent of the dict itself, with field
order preserved (a `Vec` of pairs, not a `HashMap`) since the renderer
(`render.rs`) must print fields in catalogue-declared order.
*/
use std::fmt;

/// A single signal direction's status byte, already decomposed.
///
/// Bit layout (bit 0 is the least-significant bit of the wire byte):
/// 0 all-red, 1 yellow, 2 green, 3 turn-left, 4 straight, 5 turn-right,
/// 6 pedestrian-green, 7 pedestrian-red. Vehicle-phase bits (0-2) and
/// pedestrian bits (6-7) are mutually exclusive states once decoded; turn
/// bits (3-5) are independently combinable flags on top of a green phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalStatus {
    /// Raw wire byte this was decoded from.
    pub raw: u8,
    /// Vehicle phase is all-red.
    pub all_red: bool,
    /// Vehicle phase is yellow.
    pub yellow: bool,
    /// Vehicle phase is green.
    pub green: bool,
    /// Left-turn arrow is lit (combinable with `green`).
    pub turn_left: bool,
    /// Straight-through arrow is lit (combinable with `green`).
    pub straight: bool,
    /// Right-turn arrow is lit (combinable with `green`).
    pub turn_right: bool,
    /// Pedestrian signal is steady red.
    pub ped_red: bool,
    /// Pedestrian signal is steady green.
    pub ped_green: bool,
    /// Pedestrian signal is flashing green (see module docs: the
    /// `ped_green=1 ∧ ped_red=1` encoding, not an invalid combination).
    pub ped_flash_green: bool,
}

/// The one nontrivial semantic rule in this protocol: decode a raw
/// per-direction status byte, applying the flashing-green rule in this
/// one place and nowhere else.
#[must_use]
pub fn decode_signal_status_byte(raw: u8) -> SignalStatus {
    let mut s = SignalStatus {
        raw,
        all_red: raw & 0x01 != 0,
        yellow: raw & 0x02 != 0,
        green: raw & 0x04 != 0,
        turn_left: raw & 0x08 != 0,
        straight: raw & 0x10 != 0,
        turn_right: raw & 0x20 != 0,
        ped_green: raw & 0x40 != 0,
        ped_red: raw & 0x80 != 0,
        ped_flash_green: false,
    };
    if s.ped_green && s.ped_red {
        s.ped_flash_green = true;
        s.ped_green = false;
        s.ped_red = false;
    }
    s
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut phase = Vec::new();
        if self.all_red {
            phase.push("全紅");
        }
        if self.yellow {
            phase.push("黃燈");
        }
        if self.green {
            phase.push("綠燈");
        }
        if phase.is_empty() {
            phase.push("無");
        }
        let mut turns = Vec::new();
        if self.turn_left {
            turns.push("左轉");
        }
        if self.straight {
            turns.push("直行");
        }
        if self.turn_right {
            turns.push("右轉");
        }
        let ped = if self.ped_flash_green {
            "行人綠燈閃爍"
        } else if self.ped_green {
            "行人綠燈"
        } else if self.ped_red {
            "行人紅燈"
        } else {
            "行人燈無"
        };
        write!(f, "{}", phase.join("、"))?;
        if !turns.is_empty() {
            write!(f, " {}", turns.join("、"))?;
        }
        write!(f, " {ped}")
    }
}

/// One row of a `time-segment-list` field (used by the segment-type commands).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSegment {
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Time-plan id in effect starting at this segment.
    pub plan_id: u8,
}

/// A semantically-typed field value, as produced by the parser and
/// consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An 8-bit integer field, or an 8-bit field with no `mapping`.
    U8(u8),
    /// A 16-bit big-endian integer field.
    U16(u16),
    /// A homogeneous `list<item_type>` field.
    List(Vec<Value>),
    /// A `signal-map` field: raw byte plus its little-endian-bit decomposition.
    SignalMap {
        /// Raw wire byte.
        raw: u8,
        /// Bit `i` is `(raw >> i) & 1`.
        bits: [u8; 8],
    },
    /// A `signal-status-list` field.
    SignalStatusList(Vec<SignalStatus>),
    /// A `time-segment-list` field.
    TimeSegmentList(Vec<TimeSegment>),
    /// A `weekday-list` field: raw codes 1..7 (Mon-Sun) or 11..17 (alt-week).
    WeekdayList(Vec<u8>),
    /// A field rendered through `mapping` or `post_process` into a label.
    Label(String),
    /// An enum value with no matching table entry (still stored, per §4.4).
    UnknownEnum(u8),
}

impl Value {
    /// The raw numeric form of a scalar value, for builder-side
    /// round-tripping (`parse(build(v)) = v` up to normalization, P3).
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U8(v) => Some(u32::from(*v)),
            Value::U16(v) => Some(u32::from(*v)),
            Value::SignalMap { raw, .. } => Some(u32::from(*raw)),
            Value::UnknownEnum(v) => Some(u32::from(*v)),
            _ => None,
        }
    }
}

/// A decoded message, attached to frame metadata.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// Frame sequence number.
    pub seq: u8,
    /// Controller id rendered as `TCnnn`.
    pub controller_id: String,
    /// Payload length in bytes (post-destuffing).
    pub length: usize,
    /// 16-bit command code.
    pub cmd_code: u16,
    /// Catalogue name, or `"未知指令"` for an uncatalogued code.
    pub name: String,
    /// Catalogue direction, as a label (kept as a string here so an
    /// uncatalogued message can still populate this field).
    pub direction: String,
    /// Whether the center must emit a short-ack for this message.
    pub needs_ack: bool,
    /// Upper-case hex dump of the raw on-wire frame.
    pub raw_hex: String,
    /// ISO-8601 local receive timestamp.
    pub received_at: String,
    /// Field values in catalogue-declared order (empty for uncatalogued codes).
    pub fields: Vec<(String, Value)>,
}

impl DecodedMessage {
    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pedestrian_flashing_green_truth_table() {
        for raw in 0u16..256 {
            let raw = raw as u8;
            let s = decode_signal_status_byte(raw);
            let ped_green_bit = raw & 0x40 != 0;
            let ped_red_bit = raw & 0x80 != 0;
            if ped_green_bit && ped_red_bit {
                assert!(s.ped_flash_green, "0x{raw:02x} should flash");
                assert!(!s.ped_green && !s.ped_red);
            } else {
                assert!(!s.ped_flash_green, "0x{raw:02x} should not flash");
                assert_eq!(s.ped_green, ped_green_bit);
                assert_eq!(s.ped_red, ped_red_bit);
            }
        }
    }

    #[test]
    fn example_scenario_status_byte() {
        // Scenario 4: 0x81 = all-red + pedestrian-red.
        let s = decode_signal_status_byte(0x81);
        assert!(s.all_red);
        assert!(s.ped_red);
        assert!(!s.ped_flash_green);
        assert!(!s.green);
    }

    #[test]
    fn display_reads_combined_phrase() {
        let s = decode_signal_status_byte(0x44); // green + pedestrian-green
        let text = s.to_string();
        assert!(text.contains("綠燈"));
        assert!(text.contains("行人綠燈"));
    }
}
