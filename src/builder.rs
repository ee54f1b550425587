/*! Message builder (C5).

Catalogue-driven encoding from a field-value map to a message payload,
plus the user-input parsing and range validation the interactive driver
(C9) needs. Grounded on
`examples/original_source/1592_測試程式/utils/tc_protocol.py`'s
`create_5f16_packet`/`create_5f10_packet`/etc. builder methods, which
all follow the same shape: emit group+command byte, then serialize each
field in declared order.
*/
use crate::catalogue::{self, CommandEntry, FieldType, InputType};
use crate::error::{Error, Result};
use crate::record::Value;

/// Build a message payload (command code + serialized fields) for
/// `cmd_code` from `values`, a partial field-value map keyed by field
/// name. Fields the catalogue declares but `values` omits are skipped
/// (per §4.5 step 3, "if the map contains the field name").
pub fn build_payload(cmd_code: u16, values: &[(String, Value)]) -> Result<Vec<u8>> {
    let entry = catalogue::lookup(cmd_code).ok_or(Error::UnknownCommand(cmd_code))?;
    if !entry.direction.is_buildable() {
        return Err(Error::NotBuildable(cmd_code));
    }

    let mut out = cmd_code.to_be_bytes().to_vec();
    for f in entry.fields {
        let Some((_, value)) = values.iter().find(|(n, _)| n == f.name) else {
            continue;
        };
        serialize_field(f.ty, value, &mut out)?;
    }
    Ok(out)
}

fn serialize_field(ty: FieldType, value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match (ty, value) {
        (FieldType::U8 | FieldType::SignalMap, Value::U8(v)) => {
            out.push(*v);
            Ok(())
        }
        (FieldType::U8 | FieldType::SignalMap, Value::SignalMap { raw, .. }) => {
            out.push(*raw);
            Ok(())
        }
        (FieldType::U16Be, Value::U16(v)) => {
            out.extend_from_slice(&v.to_be_bytes());
            Ok(())
        }
        (FieldType::ListU8, Value::List(items)) => {
            for item in items {
                serialize_field(FieldType::U8, item, out)?;
            }
            Ok(())
        }
        (FieldType::WeekdayList, Value::WeekdayList(days)) => {
            out.extend_from_slice(days);
            Ok(())
        }
        (FieldType::WeekdayList, Value::List(items)) => {
            for item in items {
                serialize_field(FieldType::U8, item, out)?;
            }
            Ok(())
        }
        (FieldType::ListU16Be, Value::List(items)) => {
            for item in items {
                serialize_field(FieldType::U16Be, item, out)?;
            }
            Ok(())
        }
        _ => Err(Error::MalformedField {
            field: "<builder>".to_string(),
            reason: format!("value {value:?} does not match field type {ty:?}"),
        }),
    }
}

/// Parse a single token of user input for a field whose catalogue entry
/// declares `input_type`, producing its raw numeric form. Decimal
/// requires all-ASCII digits; hex accepts an optional `0x` prefix;
/// binary requires exactly 8 (u8) or 16 (u16) `0`/`1` characters,
/// interpreted high-bit first.
pub fn parse_user_input(field_name: &str, input_type: InputType, token: &str, bits: u32) -> Result<u32> {
    let malformed = |reason: String| Error::MalformedField {
        field: field_name.to_string(),
        reason,
    };
    match input_type {
        InputType::Dec => {
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed("expected decimal digits".to_string()));
            }
            token
                .parse::<u32>()
                .map_err(|e| malformed(e.to_string()))
        }
        InputType::Hex => {
            let stripped = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")).unwrap_or(token);
            if stripped.is_empty() || !stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(malformed("expected hex digits".to_string()));
            }
            u32::from_str_radix(stripped, 16).map_err(|e| malformed(e.to_string()))
        }
        InputType::Binary => {
            let want_len = bits as usize;
            if token.len() != want_len || !token.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(malformed(format!("expected {want_len} characters of 0/1")));
            }
            u32::from_str_radix(token, 2).map_err(|e| malformed(e.to_string()))
        }
    }
}

/// Validate `raw` against a field descriptor's declared range, applying
/// the defaults from §4.5 (`0..255` for u8, `0..65535` for u16).
pub fn validate_range(field_name: &str, ty: FieldType, min: Option<u32>, max: Option<u32>, raw: u32) -> Result<()> {
    let default_max = match ty {
        FieldType::U16Be | FieldType::ListU16Be => 65535,
        _ => 255,
    };
    let lo = min.unwrap_or(0);
    let hi = max.unwrap_or(default_max);
    if raw < lo || raw > hi {
        return Err(Error::MalformedField {
            field: field_name.to_string(),
            reason: format!("{raw} out of range {lo}..={hi}"),
        });
    }
    Ok(())
}

/// Convenience: find a catalogue entry's field descriptor by name.
#[must_use]
pub fn field_descriptor<'a>(entry: &'a CommandEntry, name: &str) -> Option<&'a catalogue::FieldDescriptor> {
    entry.fields.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_control_strategy_setting_scenario_3() {
        let values = vec![
            ("control_strategy".to_string(), Value::U8(0x03)),
            ("effect_time".to_string(), Value::U16(60)),
        ];
        let payload = build_payload(0x5F10, &values).unwrap();
        assert_eq!(payload, vec![0x5F, 0x10, 0x03, 0x00, 0x3C]);
    }

    #[test]
    fn rejects_non_buildable_command() {
        let err = build_payload(0x5FC0, &[]).unwrap_err();
        assert!(matches!(err, Error::NotBuildable(0x5FC0)));
    }

    #[test]
    fn rejects_unknown_command() {
        let err = build_payload(0x5FFE, &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(0x5FFE)));
    }

    #[test]
    fn binary_input_high_bit_first() {
        assert_eq!(
            parse_user_input("f", InputType::Binary, "00000001", 8).unwrap(),
            1
        );
        assert_eq!(
            parse_user_input("f", InputType::Binary, "10000000", 8).unwrap(),
            128
        );
    }

    #[test]
    fn hex_input_accepts_0x_prefix() {
        assert_eq!(parse_user_input("f", InputType::Hex, "0x2A", 8).unwrap(), 42);
        assert_eq!(parse_user_input("f", InputType::Hex, "2a", 8).unwrap(), 42);
    }

    #[test]
    fn dec_input_rejects_non_digits() {
        assert!(parse_user_input("f", InputType::Dec, "12a", 8).is_err());
    }

    #[test]
    fn builds_phase_layout_set_with_product_count() {
        let values = vec![
            ("phase_order".to_string(), Value::U8(0x40)),
            ("signal_map".to_string(), Value::U8(0x55)),
            ("signal_count".to_string(), Value::U8(8)),
            ("sub_phase_count".to_string(), Value::U8(3)),
            (
                "signal_status".to_string(),
                Value::List((0..24).map(|_| Value::U8(0x85)).collect()),
            ),
        ];
        let payload = build_payload(0x5F13, &values).unwrap();
        assert_eq!(&payload[0..6], &[0x5F, 0x13, 0x40, 0x55, 0x08, 0x03]);
        assert_eq!(payload.len(), 6 + 24);
        assert!(payload[6..].iter().all(|b| *b == 0x85));
    }

    #[test]
    fn range_validation_rejects_out_of_bounds() {
        assert!(validate_range("control_strategy", FieldType::U8, None, None, 256).is_err());
        assert!(validate_range("effect_time", FieldType::U16Be, None, None, 70000).is_err());
        assert!(validate_range("control_strategy", FieldType::U8, None, None, 3).is_ok());
    }
}
