/*! Message parser (C4).

Catalogue-driven decoding of a logical payload into a [`DecodedMessage`].
Grounded directly on
`examples/original_source/packet/parser/unified_field_parser.py`'s
`UnifiedFieldParser.parse_fields`: a sequential walk over field
descriptors maintaining a cursor, resolving `count_from` against the
partial record built so far. The cursor here starts at 2 (past the
2-byte command code) exactly as the Python `_calculate_next_index` does.
*/
use chrono::Local;

use crate::catalogue::{self, CommandEntry, CountFrom, FieldType, Mapping};
use crate::record::{decode_signal_status_byte, DecodedMessage, TimeSegment, Value};

/// Parse a destuffed message payload (`payload[0..2]` is the command
/// code) into a decoded record. Never fails outright: an uncatalogued
/// command yields a skeleton record (§4.4 edge policy); a too-short
/// payload against the catalogue validator is surfaced by the caller
/// via [`validate_length`] before this is called.
#[must_use]
pub fn parse(seq: u8, controller_id: &str, raw: &[u8], payload: &[u8]) -> DecodedMessage {
    let raw_hex = hex_upper(raw);
    let received_at = Local::now().to_rfc3339();

    if payload.len() < 2 {
        return DecodedMessage {
            seq,
            controller_id: controller_id.to_string(),
            length: payload.len(),
            cmd_code: 0,
            name: "未知指令".to_string(),
            direction: "未知".to_string(),
            needs_ack: false,
            raw_hex,
            received_at,
            fields: Vec::new(),
        };
    }
    let cmd_code = u16::from_be_bytes([payload[0], payload[1]]);

    let Some(entry) = catalogue::lookup(cmd_code) else {
        return DecodedMessage {
            seq,
            controller_id: controller_id.to_string(),
            length: payload.len(),
            cmd_code,
            name: "未知指令".to_string(),
            direction: "未知".to_string(),
            needs_ack: false,
            raw_hex,
            received_at,
            fields: Vec::new(),
        };
    };

    let fields = walk_fields(entry, payload);

    DecodedMessage {
        seq,
        controller_id: controller_id.to_string(),
        length: payload.len(),
        cmd_code,
        name: entry.name.to_string(),
        direction: entry.direction.label().to_string(),
        needs_ack: entry.needs_ack,
        raw_hex,
        received_at,
        fields,
    }
}

/// Whether `payload`'s length satisfies `entry.validator`.
#[must_use]
pub fn validate_length(entry: &CommandEntry, payload_len: usize) -> bool {
    entry.validator.accepts(payload_len)
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Resolve a previously-parsed field's raw numeric value from the
/// partial record, for `count_from` evaluation.
fn lookup_count(partial: &[(String, Value)], name: &str) -> u32 {
    partial
        .iter()
        .find(|(n, _)| n == name)
        .and_then(|(_, v)| v.as_u32())
        .unwrap_or(0)
}

fn resolve_count(count_from: &CountFrom, partial: &[(String, Value)]) -> usize {
    match count_from {
        CountFrom::Literal(n) => *n as usize,
        CountFrom::FieldRef(name) => lookup_count(partial, name) as usize,
        CountFrom::FieldProduct(a, b) => {
            (lookup_count(partial, a) * lookup_count(partial, b)) as usize
        }
    }
}

fn apply_mapping(raw: u8, mapping: &Mapping) -> Value {
    match mapping {
        Mapping::Enum(table) => {
            if table.iter().any(|(v, _)| *v == raw) {
                Value::Label(mapping.render(raw))
            } else {
                Value::UnknownEnum(raw)
            }
        }
        Mapping::Bitfield(_) => Value::Label(mapping.render(raw)),
    }
}

/// Walk `entry.fields` in order over `payload`, starting the cursor at 2
/// (past the command code), producing the ordered field-value list.
/// Truncated lists stop at the buffer end and return the partial
/// sequence gathered so far (§4.4 edge policy); no error is raised.
fn walk_fields(entry: &CommandEntry, payload: &[u8]) -> Vec<(String, Value)> {
    let mut out: Vec<(String, Value)> = Vec::with_capacity(entry.fields.len());
    let mut i = 2usize;

    for f in entry.fields {
        if i >= payload.len() && !matches!(f.ty, FieldType::ListU8 | FieldType::ListU16Be) {
            break;
        }
        let value = match f.ty {
            FieldType::U8 => {
                let raw = payload[i];
                i += 1;
                match &f.mapping {
                    Some(m) => apply_mapping(raw, m),
                    None => Value::U8(raw),
                }
            }
            FieldType::U16Be => {
                if i + 1 >= payload.len() {
                    break;
                }
                let raw = u16::from_be_bytes([payload[i], payload[i + 1]]);
                i += 2;
                Value::U16(raw)
            }
            FieldType::SignalMap => {
                let raw = payload[i];
                i += 1;
                let mut bits = [0u8; 8];
                for (b, slot) in bits.iter_mut().enumerate() {
                    *slot = (raw >> b) & 1;
                }
                Value::SignalMap { raw, bits }
            }
            FieldType::ListU8 => {
                let count = f
                    .count_from
                    .as_ref()
                    .map(|c| resolve_count(c, &out))
                    .unwrap_or(0);
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    if i >= payload.len() {
                        break;
                    }
                    items.push(Value::U8(payload[i]));
                    i += 1;
                }
                Value::List(items)
            }
            FieldType::ListU16Be => {
                let count = f
                    .count_from
                    .as_ref()
                    .map(|c| resolve_count(c, &out))
                    .unwrap_or(0);
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    if i + 1 >= payload.len() {
                        break;
                    }
                    items.push(Value::U16(u16::from_be_bytes([payload[i], payload[i + 1]])));
                    i += 2;
                }
                Value::List(items)
            }
            FieldType::SignalStatusList => {
                let count = f
                    .count_from
                    .as_ref()
                    .map(|c| resolve_count(c, &out))
                    .unwrap_or(0);
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    if i >= payload.len() {
                        break;
                    }
                    items.push(decode_signal_status_byte(payload[i]));
                    i += 1;
                }
                Value::SignalStatusList(items)
            }
            FieldType::StructListTimeSegment | FieldType::TimeSegmentList => {
                let count = f
                    .count_from
                    .as_ref()
                    .map(|c| resolve_count(c, &out))
                    .unwrap_or(0);
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    if i + 2 >= payload.len() {
                        break;
                    }
                    items.push(TimeSegment {
                        hour: payload[i],
                        minute: payload[i + 1],
                        plan_id: payload[i + 2],
                    });
                    i += 3;
                }
                Value::TimeSegmentList(items)
            }
            FieldType::WeekdayList => {
                let count = f
                    .count_from
                    .as_ref()
                    .map(|c| resolve_count(c, &out))
                    .unwrap_or(0);
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    if i >= payload.len() {
                        break;
                    }
                    items.push(payload[i]);
                    i += 1;
                }
                Value::WeekdayList(items)
            }
        };
        let value = match f.post_process {
            Some(pp) => pp(value),
            None => value,
        };
        out.push((f.name.to_string(), value));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::lookup;

    #[test]
    fn unknown_command_yields_skeleton() {
        let payload = vec![0x5F, 0xFE, 0x01, 0x02];
        let raw = vec![0xAA, 0xBB, 0, 0, 0, 0, 0];
        let rec = parse(1, "TC003", &raw, &payload);
        assert_eq!(rec.cmd_code, 0x5FFE);
        assert_eq!(rec.name, "未知指令");
        assert!(rec.fields.is_empty());
    }

    #[test]
    fn control_strategy_reply_scenario_3() {
        let payload = vec![0x5F, 0xC0, 0x03, 0x00, 0x3C];
        let raw = payload.clone();
        let entry = lookup(0x5FC0).unwrap();
        assert!(validate_length(entry, payload.len()));
        let rec = parse(1, "TC003", &raw, &payload);
        assert_eq!(
            rec.field("control_strategy"),
            Some(&Value::Label("定時控制、動態控制 (0x03)".to_string()))
        );
        assert_eq!(rec.field("effect_time"), Some(&Value::U16(60)));
    }

    #[test]
    fn phase_step_report_scenario_4() {
        let mut payload = vec![0x5F, 0x03, 0x40, 0xD5, 0x04, 0x01, 0x02, 0x0F];
        payload.extend_from_slice(&[0x81, 0x44, 0x81, 0x41]);
        let raw = payload.clone();
        let rec = parse(9, "TC003", &raw, &payload);
        assert_eq!(rec.field("phase_order"), Some(&Value::U8(0x40)));
        match rec.field("signal_status") {
            Some(Value::SignalStatusList(items)) => {
                assert_eq!(items.len(), 4);
                assert!(items[0].all_red && items[0].ped_red);
            }
            other => panic!("expected signal status list, got {other:?}"),
        }
    }

    #[test]
    fn phase_layout_reply_decodes_product_count_list() {
        let mut payload = vec![0x5F, 0xC3, 0x40, 0x55, 0x02, 0x02];
        payload.extend_from_slice(&[0x81, 0x44, 0x04, 0x41]);
        let raw = payload.clone();
        let rec = parse(1, "TC003", &raw, &payload);
        assert_eq!(rec.name, "phase_layout_reply");
        match rec.field("signal_status") {
            Some(Value::SignalStatusList(items)) => assert_eq!(items.len(), 4),
            other => panic!("expected 4-item signal status list, got {other:?}"),
        }
    }

    #[test]
    fn control_strategy_async_report_decodes() {
        let payload = vec![0x5F, 0x00, 0x03, 0x01];
        let raw = payload.clone();
        let rec = parse(1, "TC003", &raw, &payload);
        assert_eq!(rec.name, "control_strategy_async_report");
        assert_eq!(
            rec.field("control"),
            Some(&Value::Label("定時控制、動態控制 (0x03)".to_string()))
        );
        assert_eq!(rec.field("begin_end"), Some(&Value::Label("結束".to_string())));
    }

    #[test]
    fn truncated_list_stops_at_buffer_end() {
        // signal_count claims 4 but only 2 bytes follow.
        let mut payload = vec![0x5F, 0x03, 0x40, 0xD5, 0x04, 0x01, 0x02, 0x0F];
        payload.extend_from_slice(&[0x81, 0x44]);
        let raw = payload.clone();
        let rec = parse(1, "TC003", &raw, &payload);
        match rec.field("signal_status") {
            Some(Value::SignalStatusList(items)) => assert_eq!(items.len(), 2),
            other => panic!("expected partial list, got {other:?}"),
        }
    }
}
