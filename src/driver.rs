/*! Interactive command driver (C9).

A single-session state machine driven by terminal input lines (§4.9).
Grounded on `examples/original_source/mode.py`'s `Command._command_loop`
(`help`/`status`/`history`/`quit` handling plus per-command dispatch) and
`command/session_manager.py`'s expiry check, called on every input
attempt rather than on a timer (§8 scenario 8: "submit a line; the driver
must discard the stale session").
*/
use crate::builder;
use crate::catalogue::{self, CountFrom, FieldType, InputType, Step};
use crate::center::Center;
use crate::record::{TimeSegment, Value};
use crate::render::render_confirmation_preview;
use crate::session::Session;

/// Outcome of handling one input line, for the caller (`main.rs`) to
/// print and, on `Quit`, act on.
pub enum Outcome {
    /// Lines to print; keep reading.
    Continue(Vec<String>),
    /// The operator asked to exit.
    Quit,
}

/// The command driver's state: at most one active session (§3).
#[derive(Default)]
pub struct Driver {
    session: Option<Session>,
}

impl Driver {
    /// Create an idle driver.
    #[must_use]
    pub fn new() -> Self {
        Driver { session: None }
    }

    /// Handle one line of terminal input.
    pub fn handle_line(&mut self, line: &str, center: &Center) -> Outcome {
        self.expire_stale_session();

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            self.session = None;
            return Outcome::Quit;
        }

        if self.session.is_none() {
            return self.handle_top_level(line, center);
        }

        Outcome::Continue(self.handle_session_line(line, center))
    }

    fn expire_stale_session(&mut self) {
        if self.session.as_ref().is_some_and(Session::is_expired) {
            self.session = None;
        }
    }

    fn handle_top_level(&mut self, line: &str, center: &Center) -> Outcome {
        match line.to_ascii_lowercase().as_str() {
            "" => Outcome::Continue(Vec::new()),
            "help" => Outcome::Continue(self.help_text()),
            "status" => Outcome::Continue(self.status_text(center)),
            _ => {
                let Ok(code) = u16::from_str_radix(line, 16) else {
                    return Outcome::Continue(vec![format!("未知指令: {line}")]);
                };
                match catalogue::lookup(code) {
                    Some(entry) if entry.direction.is_buildable() => {
                        self.session = Some(Session::start(entry));
                        Outcome::Continue(vec![prompt_for(entry, 1)])
                    }
                    Some(_) => Outcome::Continue(vec![format!(
                        "指令 {line} 不可建立 (非查詢/設定類型)"
                    )]),
                    None => Outcome::Continue(vec![format!("未知指令代碼: {line}")]),
                }
            }
        }
    }

    fn handle_session_line(&mut self, line: &str, center: &Center) -> Vec<String> {
        let Some(session) = &mut self.session else {
            return vec!["無進行中的工作階段".to_string()];
        };
        let Some(entry) = catalogue::lookup(session.cmd_code) else {
            self.session = None;
            return vec!["工作階段指令已失效".to_string()];
        };
        let Some(steps) = entry.steps else {
            self.session = None;
            return vec!["指令無建立步驟".to_string()];
        };

        let is_confirmation = matches!(
            steps.get(session.current_step.saturating_sub(1)),
            Some(Step::Confirmation)
        );
        if is_confirmation {
            return handle_confirmation(self, line, center, entry);
        }

        let Some(Step::Collect { fields, .. }) = steps.get(session.current_step - 1) else {
            self.session = None;
            return vec!["工作階段狀態錯誤".to_string()];
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut cursor = 0usize;
        let mut collected = Vec::new();
        for field_name in *fields {
            let Some(desc) = entry.fields.iter().find(|f| f.name == *field_name) else {
                continue;
            };
            match collect_field(desc, &tokens, &mut cursor, &session.fields_so_far, &collected) {
                Ok(v) => collected.push((field_name.to_string(), v)),
                Err(e) => return vec![format!("欄位 {field_name} 錯誤: {e}")],
            }
        }

        let next_step = session.current_step + 1;
        session.advance(next_step, collected);

        match steps.get(next_step - 1) {
            Some(Step::Confirmation) => {
                let mut out = vec!["=== 送出前確認 ===".to_string()];
                out.extend(render_confirmation_preview(&session.fields_so_far));
                out.push("送出嗎？(y/n)".to_string());
                out
            }
            Some(step) => vec![prompt_for_step(step)],
            None => {
                self.session = None;
                vec!["工作階段已結束".to_string()]
            }
        }
    }

    fn help_text(&self) -> Vec<String> {
        let mut lines = vec![
            "可用指令: help, status, q".to_string(),
            "可建立指令:".to_string(),
        ];
        for e in catalogue::CATALOGUE.iter().filter(|e| e.direction.is_buildable()) {
            lines.push(format!("  {} - {}", e.code_hex(), e.description));
        }
        lines
    }

    fn status_text(&self, center: &Center) -> Vec<String> {
        let mut lines = vec!["=== 未完成指令 ===".to_string()];
        for (seq, info) in center.correlation().snapshot() {
            lines.push(format!(
                "seq=0x{seq:02X} cmd=0x{:04X} ({})",
                info.cmd_code, info.description
            ));
        }
        if lines.len() == 1 {
            lines.push("(無)".to_string());
        }
        lines
    }
}

fn handle_confirmation(driver: &mut Driver, line: &str, center: &Center, entry: &catalogue::CommandEntry) -> Vec<String> {
    let lower = line.to_ascii_lowercase();
    if lower == "n" || lower == "cancel" {
        driver.session = None;
        return vec!["已取消".to_string()];
    }
    if lower.is_empty() || lower == "y" || lower == "yes" {
        let Some(session) = driver.session.take() else {
            return vec!["無進行中的工作階段".to_string()];
        };
        return match center.send_command(entry.code, &session.fields_so_far, entry.description) {
            Ok(seq) => vec![format!("已送出，seq=0x{seq:02X}")],
            Err(e) => vec![format!("送出失敗: {e}")],
        };
    }
    vec!["請輸入 y/yes 確認或 n/cancel 取消".to_string()]
}

fn prompt_for(entry: &catalogue::CommandEntry, step_idx: usize) -> String {
    match entry.steps.and_then(|s| s.get(step_idx - 1)) {
        Some(step) => prompt_for_step(step),
        None => "送出嗎？(y/n)".to_string(),
    }
}

fn prompt_for_step(step: &Step) -> String {
    match step {
        Step::Collect { prompt, .. } => (*prompt).to_string(),
        Step::Confirmation => "送出嗎？(y/n)".to_string(),
    }
}

fn resolve_count(
    count_from: &CountFrom,
    prior: &[(String, Value)],
    this_step: &[(String, Value)],
) -> usize {
    let find = |name: &str| -> u32 {
        this_step
            .iter()
            .chain(prior.iter())
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_u32())
            .unwrap_or(0)
    };
    match count_from {
        CountFrom::Literal(n) => *n as usize,
        CountFrom::FieldRef(name) => find(name) as usize,
        CountFrom::FieldProduct(a, b) => (find(a) * find(b)) as usize,
    }
}

fn collect_field(
    desc: &catalogue::FieldDescriptor,
    tokens: &[&str],
    cursor: &mut usize,
    prior: &[(String, Value)],
    this_step: &[(String, Value)],
) -> Result<Value, crate::error::Error> {
    let input_type = desc.input_type.unwrap_or(InputType::Dec);
    match desc.ty {
        FieldType::U8 | FieldType::SignalMap => {
            let raw = take_scalar(desc.name, tokens, cursor, input_type, 8)?;
            builder::validate_range(desc.name, desc.ty, desc.min, desc.max, raw)?;
            Ok(Value::U8(raw as u8))
        }
        FieldType::U16Be => {
            let raw = take_scalar(desc.name, tokens, cursor, input_type, 16)?;
            builder::validate_range(desc.name, desc.ty, desc.min, desc.max, raw)?;
            Ok(Value::U16(raw as u16))
        }
        FieldType::ListU8 => {
            let count = desc
                .count_from
                .as_ref()
                .map(|c| resolve_count(c, prior, this_step))
                .unwrap_or(0);
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                let raw = take_scalar(desc.name, tokens, cursor, input_type, 8)?;
                items.push(Value::U8(raw as u8));
            }
            Ok(Value::List(items))
        }
        FieldType::ListU16Be => {
            let count = desc
                .count_from
                .as_ref()
                .map(|c| resolve_count(c, prior, this_step))
                .unwrap_or(0);
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                let raw = take_scalar(desc.name, tokens, cursor, input_type, 16)?;
                items.push(Value::U16(raw as u16));
            }
            Ok(Value::List(items))
        }
        FieldType::WeekdayList => {
            let count = desc
                .count_from
                .as_ref()
                .map(|c| resolve_count(c, prior, this_step))
                .unwrap_or(0);
            let mut days = Vec::with_capacity(count);
            for _ in 0..count {
                let raw = take_scalar(desc.name, tokens, cursor, InputType::Dec, 8)?;
                days.push(raw as u8);
            }
            Ok(Value::WeekdayList(days))
        }
        FieldType::TimeSegmentList | FieldType::StructListTimeSegment => {
            let count = desc
                .count_from
                .as_ref()
                .map(|c| resolve_count(c, prior, this_step))
                .unwrap_or(0);
            let mut segs = Vec::with_capacity(count);
            for _ in 0..count {
                let token = tokens.get(*cursor).ok_or_else(|| crate::error::Error::MalformedField {
                    field: desc.name.to_string(),
                    reason: "missing time-segment token (expected HH:MM:planid)".to_string(),
                })?;
                *cursor += 1;
                segs.push(parse_time_segment(desc.name, token)?);
            }
            Ok(Value::TimeSegmentList(segs))
        }
        FieldType::SignalStatusList => Err(crate::error::Error::MalformedField {
            field: desc.name.to_string(),
            reason: "signal-status-list is report-only, not buildable".to_string(),
        }),
    }
}

fn take_scalar(
    field: &str,
    tokens: &[&str],
    cursor: &mut usize,
    input_type: InputType,
    bits: u32,
) -> Result<u32, crate::error::Error> {
    let token = tokens
        .get(*cursor)
        .ok_or_else(|| crate::error::Error::MalformedField {
            field: field.to_string(),
            reason: "missing token".to_string(),
        })?;
    *cursor += 1;
    builder::parse_user_input(field, input_type, token, bits)
}

fn parse_time_segment(field: &str, token: &str) -> Result<TimeSegment, crate::error::Error> {
    let malformed = || crate::error::Error::MalformedField {
        field: field.to_string(),
        reason: format!("expected HH:MM:planid, got {token}"),
    };
    let mut parts = token.split(':');
    let hour: u8 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    let minute: u8 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    let plan_id: u8 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok(TimeSegment { hour, minute, plan_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

    fn test_center() -> Center {
        let sock = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr: SocketAddr = (Ipv4Addr::LOCALHOST, 7002).into();
        Center::new(sock, addr, 3, "TC003".to_string(), catalogue::Mode::Command)
    }

    #[test]
    fn builds_control_strategy_command_end_to_end() {
        let center = test_center();
        let mut driver = Driver::new();
        match driver.handle_line("5F10", &center) {
            Outcome::Continue(lines) => assert!(!lines.is_empty()),
            Outcome::Quit => panic!("should not quit"),
        }
        match driver.handle_line("3 60", &center) {
            Outcome::Continue(lines) => assert!(lines.iter().any(|l| l.contains("確認"))),
            Outcome::Quit => panic!("should not quit"),
        }
        match driver.handle_line("y", &center) {
            Outcome::Continue(lines) => assert!(lines[0].contains("已送出")),
            Outcome::Quit => panic!("should not quit"),
        }
        assert!(driver.session.is_none());
    }

    #[test]
    fn phase_layout_set_multi_step_build_scenario_6() {
        let center = test_center();
        let mut driver = Driver::new();
        match driver.handle_line("5F13", &center) {
            Outcome::Continue(lines) => assert!(!lines.is_empty()),
            Outcome::Quit => panic!("should not quit"),
        }
        // phase_order (hex) signal_map (binary) signal_count sub_phase_count
        match driver.handle_line("40 10101010 8 3", &center) {
            Outcome::Continue(lines) => assert!(!lines.is_empty()),
            Outcome::Quit => panic!("should not quit"),
        }
        let statuses: Vec<&str> = std::iter::repeat("85").take(24).collect();
        match driver.handle_line(&statuses.join(" "), &center) {
            Outcome::Continue(lines) => assert!(lines.iter().any(|l| l.contains("確認"))),
            Outcome::Quit => panic!("should not quit"),
        }
        match driver.handle_line("y", &center) {
            Outcome::Continue(lines) => assert!(lines[0].contains("已送出")),
            Outcome::Quit => panic!("should not quit"),
        }
        assert!(driver.session.is_none());
    }

    #[test]
    fn cancel_discards_session() {
        let center = test_center();
        let mut driver = Driver::new();
        driver.handle_line("5F10", &center);
        driver.handle_line("3 60", &center);
        match driver.handle_line("n", &center) {
            Outcome::Continue(lines) => assert!(lines[0].contains("已取消")),
            Outcome::Quit => panic!("should not quit"),
        }
        assert!(driver.session.is_none());
    }

    #[test]
    fn q_quits_and_discards_session() {
        let center = test_center();
        let mut driver = Driver::new();
        driver.handle_line("5F10", &center);
        match driver.handle_line("q", &center) {
            Outcome::Quit => {}
            Outcome::Continue(_) => panic!("should quit"),
        }
        assert!(driver.session.is_none());
    }

    #[test]
    fn unknown_top_level_command_is_reported() {
        let center = test_center();
        let mut driver = Driver::new();
        match driver.handle_line("ZZZZ", &center) {
            Outcome::Continue(lines) => assert!(lines[0].contains("未知指令")),
            Outcome::Quit => panic!("should not quit"),
        }
    }

    #[test]
    fn expired_session_is_discarded_on_next_input() {
        let center = test_center();
        let mut driver = Driver::new();
        driver.handle_line("5F10", &center);
        assert!(driver.session.is_some());
        driver
            .session
            .as_mut()
            .unwrap()
            .backdate_for_test(crate::session::EXPIRY + std::time::Duration::from_secs(1));

        // A fresh top-level command should now be accepted, not treated
        // as session input, because the stale session was discarded.
        match driver.handle_line("5F40", &center) {
            Outcome::Continue(lines) => assert!(!lines.is_empty()),
            Outcome::Quit => panic!("should not quit"),
        }
        let session = driver.session.as_ref().unwrap();
        assert_eq!(session.cmd_code, 0x5F40);
    }
}
