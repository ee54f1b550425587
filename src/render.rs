/*! Renderer (C6).

Produces the stable multi-line log representation of a decoded record,
one log line per text line (§6, "multi-line renderings are logged as a
sequence of single-line entries"). Grounded near-verbatim on
`examples/original_source/1592_測試程式/utils/tc_core.py`'s
`print_packet_info`/`_display_packet_details` and
`packet/definitions/group_5f.py`'s `format_5f03_signal_status`.
*/
use crate::record::{DecodedMessage, Value};

const RULE: &str = "============================================================";

/// Render a decoded record into the ordered log lines §4.6 specifies.
#[must_use]
pub fn render(rec: &DecodedMessage) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(RULE.to_string());
    lines.push(format!("接收 {} 封包: {}", rec.name, rec.raw_hex));
    lines.push("=== 封包詳細資訊 ===".to_string());
    lines.push(format!("序列號 (SEQ): 0x{:02X}", rec.seq));
    lines.push(format!("控制器編號: {}", rec.controller_id));
    lines.push(format!("指令: {}", rec.name));
    lines.push(format!("訊息型態: {}", rec.direction));
    for (name, value) in &rec.fields {
        lines.extend(render_field(name, value));
    }
    lines.push(format!("原始資料: {}", rec.raw_hex));
    lines.push(format!("接收時間: {}", rec.received_at));
    lines.push(RULE.to_string());
    lines
}

fn render_field(name: &str, value: &Value) -> Vec<String> {
    match value {
        Value::U8(v) => vec![format!("{name}: {v}")],
        Value::U16(v) => vec![format!("{name}: {v}")],
        Value::Label(label) => vec![format!("{name}: {label}")],
        Value::UnknownEnum(raw) => vec![format!("{name}: 未知(0x{raw:02X})")],
        Value::SignalMap { raw, bits } => {
            let bits_str = bits
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(",");
            vec![format!("{name}: 0x{raw:02X} = [{bits_str}]")]
        }
        Value::SignalStatusList(items) => items
            .iter()
            .enumerate()
            .map(|(i, s)| format!("   方向 {}: {}", i + 1, s))
            .collect(),
        Value::TimeSegmentList(items) => items
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                format!(
                    "時段 {}: {:02}:{:02} (計畫ID: {})",
                    i + 1,
                    seg.hour,
                    seg.minute,
                    seg.plan_id
                )
            })
            .collect(),
        Value::WeekdayList(days) => {
            let rendered: Vec<String> = days.iter().map(|d| weekday_label(*d)).collect();
            vec![format!("{name}: {}", rendered.join("、"))]
        }
        Value::List(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|v| match v {
                    Value::U8(n) => n.to_string(),
                    Value::U16(n) => n.to_string(),
                    other => format!("{other:?}"),
                })
                .collect();
            vec![format!("{name}: [{}]", rendered.join(","))]
        }
    }
}

/// Map a weekday code (1..7 Mon-Sun, 11..17 alt-week) to its label.
fn weekday_label(code: u8) -> String {
    const NAMES: [&str; 7] = ["週一", "週二", "週三", "週四", "週五", "週六", "週日"];
    match code {
        1..=7 => NAMES[(code - 1) as usize].to_string(),
        11..=17 => format!("{}(隔週)", NAMES[(code - 11) as usize]),
        other => format!("未知({other})"),
    }
}

/// Preview a confirmation step's accumulated fields as `name: 0xNN (NN)`,
/// truncating list fields to the first five elements with `…` when the
/// list has more than 10 (§4.9).
#[must_use]
pub fn render_confirmation_preview(fields: &[(String, Value)]) -> Vec<String> {
    fields
        .iter()
        .map(|(name, value)| match value {
            Value::U8(v) => format!("{name}: 0x{v:02X} ({v})"),
            Value::U16(v) => format!("{name}: 0x{v:04X} ({v})"),
            Value::List(items) => preview_list(name, items.len(), items.iter().map(scalar_text)),
            Value::WeekdayList(items) => {
                preview_list(name, items.len(), items.iter().map(|v| v.to_string()))
            }
            other => format!("{name}: {other:?}"),
        })
        .collect()
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::U8(n) => n.to_string(),
        Value::U16(n) => n.to_string(),
        other => format!("{other:?}"),
    }
}

fn preview_list(name: &str, len: usize, items: impl Iterator<Item = String>) -> String {
    let mut shown: Vec<String> = items.take(5).collect();
    if len > 10 {
        shown.push("…".to_string());
    }
    format!("{name}: [{}]", shown.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn hardware_status_empty_renders_normal() {
        let payload = vec![0x0F, 0x04, 0x00];
        let rec = parse(1, "TC003", &payload, &payload);
        let lines = render(&rec);
        assert!(lines.iter().any(|l| l == "status: 系統正常"));
    }

    #[test]
    fn weekday_alt_week_suffix() {
        assert_eq!(weekday_label(11), "週一(隔週)");
        assert_eq!(weekday_label(1), "週一");
    }

    #[test]
    fn confirmation_preview_truncates_long_lists() {
        let items: Vec<Value> = (0..12).map(Value::U8).collect();
        let fields = vec![("xs".to_string(), Value::List(items))];
        let preview = render_confirmation_preview(&fields);
        assert!(preview[0].ends_with("…]"));
    }

    #[test]
    fn phase_step_renders_one_line_per_direction() {
        let mut payload = vec![0x5F, 0x03, 0x40, 0xD5, 0x02, 0x01, 0x02, 0x0F];
        payload.extend_from_slice(&[0x81, 0x44]);
        let rec = parse(1, "TC003", &payload, &payload);
        let lines = render(&rec);
        assert!(lines.iter().any(|l| l.starts_with("   方向 1:")));
        assert!(lines.iter().any(|l| l.starts_with("   方向 2:")));
    }
}
