/*! Command catalogue.

The single source of truth for parsing, building, validating, prompting
and rendering every command code this gateway understands. Grounded on
`examples/original_source/1592_測試程式/utils/tc_core.py`'s
`COMMAND_REGISTRY` dict (which maps a hex code to name/parser/processor)
and `packet/parser/unified_field_parser.py`'s field-walk design, both
replaced here by the static sum types the design notes call for (§9):
`CountFrom`, `Mapping`, and a per-command `&'static [FieldDescriptor]`
instead of Python closures and dict-or-function `mapping` values.
*/
use crate::record::Value;

/// Runtime mode, used to filter which commands get logged (§4.3 `log_modes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Passive receive-only mode.
    Receive,
    /// Interactive command-driving mode.
    Command,
}

/// Which side originates a command, and what role it plays in a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the host, expects a reply.
    Query,
    /// Sent by the host, changes controller state.
    Setting,
    /// Controller's reply to a query.
    QueryReply,
    /// Controller's reply to a setting (ok or error).
    SettingReply,
    /// Controller-initiated, unsolicited.
    AsyncReport,
    /// A short-ack (not catalogued as such, kept for completeness).
    AckReply,
}

impl Direction {
    /// Human label, used when populating [`crate::record::DecodedMessage::direction`].
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Direction::Query => "查詢",
            Direction::Setting => "設定",
            Direction::QueryReply => "查詢回應",
            Direction::SettingReply => "設定回應",
            Direction::AsyncReport => "主動回報",
            Direction::AckReply => "確認",
        }
    }

    /// Whether this direction can be produced by the builder (C5).
    #[must_use]
    pub fn is_buildable(self) -> bool {
        matches!(self, Direction::Query | Direction::Setting)
    }
}

/// Per-command payload length requirement (excluding frame overhead).
#[derive(Debug, Clone, Copy)]
pub enum Validator {
    /// Payload must be at least this many bytes.
    MinLength(usize),
    /// Payload must be exactly this many bytes.
    ExactLength(usize),
}

impl Validator {
    /// Check `len` (total payload length, including the 2-byte command code).
    #[must_use]
    pub fn accepts(self, len: usize) -> bool {
        match self {
            Validator::MinLength(n) => len >= n,
            Validator::ExactLength(n) => len == n,
        }
    }
}

/// How a `list`/`struct-list`/specialized-list field's element count is
/// resolved from already-parsed fields. Replaces the source's inline
/// lambda `count_from` (§9).
#[derive(Debug, Clone, Copy)]
pub enum CountFrom {
    /// A fixed count, known ahead of time.
    Literal(u32),
    /// The value of a previously-parsed `u8`/`u16` field.
    FieldRef(&'static str),
    /// The product of two previously-parsed fields (the only observed
    /// non-trivial shape in the source, e.g. `sub_phase_count * 2`).
    FieldProduct(&'static str, &'static str),
}

/// How raw user input text is parsed for a buildable field (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// Base-10 ASCII digits.
    Dec,
    /// Optional `0x` prefix, hex digits.
    Hex,
    /// Exactly 8 (u8) or 16 (u16) characters of `0`/`1`, high-bit first.
    Binary,
}

/// How a raw byte is turned into a label. Replaces the source's
/// dict-or-function `mapping` value (§9) with an explicit sum type.
#[derive(Clone, Copy)]
pub enum Mapping {
    /// Direct table lookup; unmatched values render as `未知(0xNN)`.
    Enum(&'static [(u8, &'static str)]),
    /// A bitfield whose active bits are individually labelled and composed.
    Bitfield(fn(u8) -> String),
}

impl std::fmt::Debug for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mapping::Enum(table) => f.debug_tuple("Enum").field(table).finish(),
            Mapping::Bitfield(_) => f.write_str("Bitfield(..)"),
        }
    }
}

impl Mapping {
    /// Render `raw` through this mapping.
    #[must_use]
    pub fn render(&self, raw: u8) -> String {
        match self {
            Mapping::Enum(table) => table
                .iter()
                .find(|(v, _)| *v == raw)
                .map(|(_, label)| (*label).to_string())
                .unwrap_or_else(|| format!("未知(0x{raw:02x})")),
            Mapping::Bitfield(f) => f(raw),
        }
    }
}

/// A field's shape within a command's payload.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    /// One byte.
    U8,
    /// Two bytes, big-endian.
    U16Be,
    /// A homogeneous sequence of `u8` items, count from `count_from`.
    ListU8,
    /// A homogeneous sequence of big-endian `u16` items, count from `count_from`.
    ListU16Be,
    /// A sequence of fixed-shape sub-records (time segments: hour/minute/plan_id).
    StructListTimeSegment,
    /// A single byte plus its 8-bit decomposition.
    SignalMap,
    /// A sequence of per-direction status bytes, count from `count_from`.
    SignalStatusList,
    /// Specialized struct-list for segment-type commands.
    TimeSegmentList,
    /// A sequence of weekday codes (1..7, or 11..17 for alt-week).
    WeekdayList,
}

/// A single field's parse/build/validate/prompt/render metadata.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Field name, also the key under which its value is stored.
    pub name: &'static str,
    /// Wire shape.
    pub ty: FieldType,
    /// Element-count source for list-shaped fields.
    pub count_from: Option<CountFrom>,
    /// How builder-side user text is parsed.
    pub input_type: Option<InputType>,
    /// How a raw byte value is rendered into a label.
    pub mapping: Option<Mapping>,
    /// Rewrite the stored value after parsing (e.g. signal-map expansion).
    pub post_process: Option<fn(Value) -> Value>,
    /// Minimum accepted raw value for range validation (builder side).
    pub min: Option<u32>,
    /// Maximum accepted raw value for range validation (builder side).
    pub max: Option<u32>,
}

impl FieldDescriptor {
    const fn new(name: &'static str, ty: FieldType) -> Self {
        FieldDescriptor {
            name,
            ty,
            count_from: None,
            input_type: None,
            mapping: None,
            post_process: None,
            min: None,
            max: None,
        }
    }
}

/// One step of a buildable command's interactive session.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Collect the named fields with the given prompt template.
    Collect {
        /// Field names this step collects, in order.
        fields: &'static [&'static str],
        /// Prompt shown to the operator.
        prompt: &'static str,
    },
    /// Preview every accumulated field and gate the send on `y`/`yes`.
    Confirmation,
}

/// A catalogue entry: everything known about one command code.
#[derive(Debug, Clone, Copy)]
pub struct CommandEntry {
    /// 16-bit command code (group byte + command byte).
    pub code: u16,
    /// Short name, used in logs.
    pub name: &'static str,
    /// Longer human description.
    pub description: &'static str,
    /// Origin/role of this command.
    pub direction: Direction,
    /// Whether the receiver must emit a short-ack after processing.
    pub needs_ack: bool,
    /// Which runtime modes render this command to the log.
    pub log_modes: &'static [Mode],
    /// Ordered field descriptors (payload after the 2-byte command code).
    pub fields: &'static [FieldDescriptor],
    /// Payload length requirement.
    pub validator: Validator,
    /// Interactive build steps; `None` for non-buildable commands.
    pub steps: Option<&'static [Step]>,
}

impl CommandEntry {
    /// Four-hex-digit rendering of `code`, as used throughout the logs.
    #[must_use]
    pub fn code_hex(&self) -> String {
        format!("{:04X}", self.code)
    }
}

/// Compose the active-bit labels of `raw` against `table`, as
/// `label1、label2 (0xNN)`, or `none` when no bit is set.
fn render_bitfield(raw: u8, table: &[(u8, &str)], none: &str) -> String {
    let active: Vec<&str> = table
        .iter()
        .filter(|(bit, _)| raw & bit != 0)
        .map(|(_, label)| *label)
        .collect();
    if active.is_empty() {
        none.to_string()
    } else {
        format!("{} (0x{:02X})", active.join("、"), raw)
    }
}

/// Control-strategy byte (`config/constants.py`'s `CS_*` bits), composed
/// via `tc_core.py`'s `get_control_strategy_desc`.
pub fn render_control_strategy(raw: u8) -> String {
    const TABLE: &[(u8, &str)] = &[
        (0x01, "定時控制"),
        (0x02, "動態控制"),
        (0x04, "路口手動"),
        (0x08, "中央手動"),
        (0x10, "時相控制"),
        (0x20, "即時控制"),
        (0x40, "觸動控制"),
        (0x80, "特別路線控制"),
    ];
    render_bitfield(raw, TABLE, "無設定策略")
}

/// Field-manual operation bitfield (`0x5F08`), the 4-entry mapping the
/// source's `process_5f08_packet` applies.
pub fn render_field_manual_op(raw: u8) -> String {
    const TABLE: &[(u8, &str)] = &[
        (0x01, "現場手動"),
        (0x02, "現場閃光"),
        (0x04, "現場全紅"),
        (0x08, "現場關燈"),
    ];
    render_bitfield(raw, TABLE, "無現場操作")
}

/// Hardware-status bitfield (`0x0F04`); empty renders as `系統正常` per §4.6.
pub fn render_hardware_status(raw: u8) -> String {
    const TABLE: &[(u8, &str)] = &[
        (0x01, "燈箱故障"),
        (0x02, "電源異常"),
        (0x04, "通訊異常"),
        (0x08, "偵測器故障"),
        (0x10, "時鐘異常"),
        (0x20, "記憶體異常"),
        (0x40, "感測器異常"),
        (0x80, "其他硬體異常"),
    ];
    render_bitfield(raw, TABLE, "系統正常")
}

/// Setting-reply error-code bitfield (`0x0F81`), the 8-entry table from
/// `tc_protocol.py` (lines ~715-724).
pub fn render_setting_error(raw: u8) -> String {
    const TABLE: &[(u8, &str)] = &[
        (0x01, "無此指令"),
        (0x02, "參數範圍錯誤"),
        (0x04, "位元順序錯誤"),
        (0x08, "設備關列錯誤"),
        (0x10, "忙碌中"),
        (0x20, "資料內容錯誤"),
        (0x40, "參數個數超過實體限制"),
        (0x80, "無此項號或實體不存在"),
    ];
    render_bitfield(raw, TABLE, "無錯誤")
}

/// Expand a [`Value::SignalMap`] into its rendered `post_process` form
/// (a no-op on the stored shape; the raw bits already carry everything
/// the renderer needs, this exists as the named hook §9 calls for).
fn post_process_signal_map(v: Value) -> Value {
    v
}

const BOTH_MODES: &[Mode] = &[Mode::Receive, Mode::Command];

macro_rules! field {
    ($name:expr, $ty:expr) => {
        FieldDescriptor::new($name, $ty)
    };
}

static PHASE_STEP_FIELDS: &[FieldDescriptor] = &[
    field!("phase_order", FieldType::U8),
    FieldDescriptor {
        post_process: Some(post_process_signal_map),
        ..field!("signal_map", FieldType::SignalMap)
    },
    field!("signal_count", FieldType::U8),
    field!("sub_phase_id", FieldType::U8),
    field!("step_id", FieldType::U8),
    field!("step_sec", FieldType::U8),
    FieldDescriptor {
        count_from: Some(CountFrom::FieldRef("signal_count")),
        ..field!("signal_status", FieldType::SignalStatusList)
    },
];

static CONTROL_STRATEGY_SETTING_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        input_type: Some(InputType::Hex),
        ..field!("control_strategy", FieldType::U8)
    },
    FieldDescriptor {
        input_type: Some(InputType::Dec),
        min: Some(0),
        max: Some(65535),
        ..field!("effect_time", FieldType::U16Be)
    },
];

static CONTROL_STRATEGY_REPLY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        mapping: Some(Mapping::Bitfield(render_control_strategy)),
        ..field!("control_strategy", FieldType::U8)
    },
    field!("effect_time", FieldType::U16Be),
];

static FIELD_MANUAL_OP_FIELDS: &[FieldDescriptor] = &[FieldDescriptor {
    mapping: Some(Mapping::Bitfield(render_field_manual_op)),
    ..field!("field_op", FieldType::U8)
}];

static HARDWARE_STATUS_FIELDS: &[FieldDescriptor] = &[FieldDescriptor {
    mapping: Some(Mapping::Bitfield(render_hardware_status)),
    ..field!("status", FieldType::U8)
}];

static SETTING_OK_FIELDS: &[FieldDescriptor] = &[field!("ack_code", FieldType::U8)];

static SETTING_ERROR_FIELDS: &[FieldDescriptor] = &[FieldDescriptor {
    mapping: Some(Mapping::Bitfield(render_setting_error)),
    ..field!("error_code", FieldType::U8)
}];

static EQUIPMENT_NUMBER_FIELDS: &[FieldDescriptor] = &[
    field!("equipment_no", FieldType::U8),
    field!("sub_count", FieldType::U8),
    FieldDescriptor {
        count_from: Some(CountFrom::FieldRef("sub_count")),
        ..field!("sub_equipment_no", FieldType::ListU8)
    },
    field!("equipment_id", FieldType::U8),
];

static MANUAL_TIME_CHANGE_FIELDS: &[FieldDescriptor] = &[
    field!("year", FieldType::U8),
    field!("month", FieldType::U8),
    field!("day", FieldType::U8),
    field!("hour", FieldType::U8),
    field!("minute", FieldType::U8),
    field!("second", FieldType::U8),
];

static STEP_TRANSITION_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        mapping: Some(Mapping::Bitfield(render_control_strategy)),
        ..field!("control_strategy", FieldType::U8)
    },
    field!("sub_phase_id", FieldType::U8),
    field!("step_id", FieldType::U8),
];

static PLAN_QUERY_REPLY_FIELDS: &[FieldDescriptor] = &[
    field!("plan_id", FieldType::U8),
    field!("direct", FieldType::U8),
    field!("phase_order", FieldType::U8),
    field!("sub_phase_count", FieldType::U8),
    FieldDescriptor {
        count_from: Some(CountFrom::FieldRef("sub_phase_count")),
        ..field!("green_times", FieldType::ListU16Be)
    },
    field!("cycle_time", FieldType::U16Be),
    field!("offset", FieldType::U16Be),
];

static PLAN_SELECT_FIELDS: &[FieldDescriptor] = &[FieldDescriptor {
    input_type: Some(InputType::Dec),
    ..field!("plan_id", FieldType::U8)
}];

static PLAN_QUERY_FIELDS: &[FieldDescriptor] = &[];

static SEGMENT_TYPE_SET_FIELDS: &[FieldDescriptor] = &[
    field!("segment_type", FieldType::U8),
    FieldDescriptor {
        input_type: Some(InputType::Dec),
        ..field!("segment_count", FieldType::U8)
    },
    FieldDescriptor {
        count_from: Some(CountFrom::FieldRef("segment_count")),
        ..field!("segments", FieldType::TimeSegmentList)
    },
    field!("weekday_count", FieldType::U8),
    FieldDescriptor {
        count_from: Some(CountFrom::FieldRef("weekday_count")),
        ..field!("weekdays", FieldType::WeekdayList)
    },
];

static SEGMENT_TYPE_QUERY_FIELDS: &[FieldDescriptor] =
    &[field!("segment_type", FieldType::U8)];

static SEGMENT_TYPE_REPLY_FIELDS: &[FieldDescriptor] = &[
    field!("segment_type", FieldType::U8),
    field!("segment_count", FieldType::U8),
    FieldDescriptor {
        count_from: Some(CountFrom::FieldRef("segment_count")),
        ..field!("segments", FieldType::TimeSegmentList)
    },
    field!("weekday_count", FieldType::U8),
    FieldDescriptor {
        count_from: Some(CountFrom::FieldRef("weekday_count")),
        ..field!("weekdays", FieldType::WeekdayList)
    },
];

static EQUIPMENT_QUERY_FIELDS: &[FieldDescriptor] = &[];

static FIELD_RESET_FIELDS: &[FieldDescriptor] = &[field!("reset_code", FieldType::U16Be)];

static PHASE_LAYOUT_SET_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        input_type: Some(InputType::Hex),
        ..field!("phase_order", FieldType::U8)
    },
    FieldDescriptor {
        input_type: Some(InputType::Binary),
        ..field!("signal_map", FieldType::U8)
    },
    FieldDescriptor {
        input_type: Some(InputType::Dec),
        min: Some(1),
        max: Some(8),
        ..field!("signal_count", FieldType::U8)
    },
    FieldDescriptor {
        input_type: Some(InputType::Dec),
        min: Some(1),
        max: Some(8),
        ..field!("sub_phase_count", FieldType::U8)
    },
    FieldDescriptor {
        input_type: Some(InputType::Hex),
        count_from: Some(CountFrom::FieldProduct("signal_count", "sub_phase_count")),
        ..field!("signal_status", FieldType::ListU8)
    },
];

static PHASE_LAYOUT_QUERY_FIELDS: &[FieldDescriptor] = &[FieldDescriptor {
    input_type: Some(InputType::Hex),
    ..field!("phase_order", FieldType::U8)
}];

static PHASE_LAYOUT_REPLY_FIELDS: &[FieldDescriptor] = &[
    field!("phase_order", FieldType::U8),
    FieldDescriptor {
        post_process: Some(post_process_signal_map),
        ..field!("signal_map", FieldType::SignalMap)
    },
    field!("signal_count", FieldType::U8),
    field!("sub_phase_count", FieldType::U8),
    FieldDescriptor {
        count_from: Some(CountFrom::FieldProduct("signal_count", "sub_phase_count")),
        ..field!("signal_status", FieldType::SignalStatusList)
    },
];

static CONTROL_STRATEGY_ASYNC_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        mapping: Some(Mapping::Bitfield(render_control_strategy)),
        ..field!("control", FieldType::U8)
    },
    FieldDescriptor {
        mapping: Some(Mapping::Enum(&[(0x00, "開始"), (0x01, "結束")])),
        ..field!("begin_end", FieldType::U8)
    },
];

static PHASE_LAYOUT_SET_STEPS: &[Step] = &[
    Step::Collect {
        fields: &["phase_order", "signal_map", "signal_count", "sub_phase_count"],
        prompt: "時相編號(hex) 號誌位置圖(binary) 信號燈數量(dec) 分相數目(dec):",
    },
    Step::Collect {
        fields: &["signal_status"],
        prompt: "各信號狀態位元組 (hex)，以空白分隔:",
    },
    Step::Confirmation,
];

static PHASE_LAYOUT_QUERY_STEPS: &[Step] = &[
    Step::Collect {
        fields: &["phase_order"],
        prompt: "時相編號 (hex):",
    },
    Step::Confirmation,
];

static TRANSMIT_TYPE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        input_type: Some(InputType::Dec),
        ..field!("transmit_type", FieldType::U8)
    },
    FieldDescriptor {
        input_type: Some(InputType::Dec),
        ..field!("cycle", FieldType::U16Be)
    },
];

static PHASE_STEP_STEPS: &[Step] = &[];

static CONTROL_STRATEGY_SETTING_STEPS: &[Step] = &[
    Step::Collect {
        fields: &["control_strategy", "effect_time"],
        prompt: "控制策略 (hex) 與生效秒數 (dec):",
    },
    Step::Confirmation,
];

static CONTROL_STRATEGY_QUERY_STEPS: &[Step] = &[Step::Confirmation];

static FIELD_RESET_STEPS: &[Step] = &[Step::Confirmation];

static PLAN_SELECT_STEPS: &[Step] = &[
    Step::Collect {
        fields: &["plan_id"],
        prompt: "時制計畫編號 (dec):",
    },
    Step::Confirmation,
];

static PLAN_QUERY_STEPS: &[Step] = &[Step::Confirmation];

static SEGMENT_TYPE_SET_STEPS: &[Step] = &[
    Step::Collect {
        fields: &["segment_type", "segment_count"],
        prompt: "週內日時段種類與筆數 (dec):",
    },
    Step::Collect {
        fields: &["segments"],
        prompt: "各時段 HH:MM PlanID，空白分隔:",
    },
    Step::Collect {
        fields: &["weekday_count", "weekdays"],
        prompt: "適用星期筆數與代碼 (dec):",
    },
    Step::Confirmation,
];

static SEGMENT_TYPE_QUERY_STEPS: &[Step] = &[
    Step::Collect {
        fields: &["segment_type"],
        prompt: "週內日時段種類 (dec):",
    },
    Step::Confirmation,
];

static EQUIPMENT_QUERY_STEPS: &[Step] = &[Step::Confirmation];

static TRANSMIT_TYPE_STEPS: &[Step] = &[
    Step::Collect {
        fields: &["transmit_type", "cycle"],
        prompt: "傳輸型態與週期 (dec):",
    },
    Step::Confirmation,
];

/// The full, immutable command catalogue. Required coverage per
/// `SPEC_FULL.md`'s "SUPPLEMENTED FROM ORIGINAL SOURCE" list.
pub static CATALOGUE: &[CommandEntry] = &[
    CommandEntry {
        code: 0x5F03,
        name: "phase_step_report",
        description: "主動回報號誌控制器步階轉換之資料",
        direction: Direction::AsyncReport,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: PHASE_STEP_FIELDS,
        validator: Validator::MinLength(8),
        steps: Some(PHASE_STEP_STEPS),
    },
    CommandEntry {
        code: 0x5F08,
        name: "field_manual_op_report",
        description: "回報號誌控制器現場操作",
        direction: Direction::AsyncReport,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: FIELD_MANUAL_OP_FIELDS,
        validator: Validator::ExactLength(3),
        steps: None,
    },
    CommandEntry {
        code: 0x5F10,
        name: "control_strategy_set",
        description: "控制策略設定",
        direction: Direction::Setting,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: CONTROL_STRATEGY_SETTING_FIELDS,
        validator: Validator::ExactLength(5),
        steps: Some(CONTROL_STRATEGY_SETTING_STEPS),
    },
    CommandEntry {
        code: 0x5FC0,
        name: "control_strategy_reply",
        description: "控制策略回報",
        direction: Direction::QueryReply,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: CONTROL_STRATEGY_REPLY_FIELDS,
        validator: Validator::ExactLength(5),
        steps: None,
    },
    CommandEntry {
        code: 0x5F40,
        name: "control_strategy_query",
        description: "查詢控制策略",
        direction: Direction::Query,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: &[],
        validator: Validator::ExactLength(2),
        steps: Some(CONTROL_STRATEGY_QUERY_STEPS),
    },
    CommandEntry {
        code: 0x0F04,
        name: "hardware_status_report",
        description: "系統狀態回報",
        direction: Direction::AsyncReport,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: HARDWARE_STATUS_FIELDS,
        validator: Validator::ExactLength(3),
        steps: None,
    },
    CommandEntry {
        code: 0x0F80,
        name: "setting_reply_ok",
        description: "指令成功回應",
        direction: Direction::SettingReply,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: SETTING_OK_FIELDS,
        validator: Validator::ExactLength(3),
        steps: None,
    },
    CommandEntry {
        code: 0x0F81,
        name: "setting_reply_error",
        description: "指令失敗回應",
        direction: Direction::SettingReply,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: SETTING_ERROR_FIELDS,
        validator: Validator::ExactLength(3),
        steps: None,
    },
    CommandEntry {
        code: 0x0FC0,
        name: "equipment_number_reply",
        description: "查詢現場設備編號回報",
        direction: Direction::QueryReply,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: EQUIPMENT_NUMBER_FIELDS,
        validator: Validator::MinLength(4),
        steps: None,
    },
    CommandEntry {
        code: 0x0F02,
        name: "manual_time_change_report",
        description: "回報終端設備現場手動更改時間",
        direction: Direction::AsyncReport,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: MANUAL_TIME_CHANGE_FIELDS,
        validator: Validator::ExactLength(8),
        steps: None,
    },
    CommandEntry {
        code: 0x5F0C,
        name: "step_transition_report",
        description: "時相步階變換回報",
        direction: Direction::AsyncReport,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: STEP_TRANSITION_FIELDS,
        validator: Validator::ExactLength(5),
        steps: None,
    },
    CommandEntry {
        code: 0x5FC8,
        name: "plan_query_reply",
        description: "回報目前時制計畫內容",
        direction: Direction::QueryReply,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: PLAN_QUERY_REPLY_FIELDS,
        validator: Validator::MinLength(10),
        steps: None,
    },
    CommandEntry {
        code: 0x5F18,
        name: "plan_select",
        description: "時制計畫選擇設定",
        direction: Direction::Setting,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: PLAN_SELECT_FIELDS,
        validator: Validator::ExactLength(3),
        steps: Some(PLAN_SELECT_STEPS),
    },
    CommandEntry {
        code: 0x5F48,
        name: "plan_query",
        description: "查詢目前時制計畫",
        direction: Direction::Query,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: PLAN_QUERY_FIELDS,
        validator: Validator::ExactLength(2),
        steps: Some(PLAN_QUERY_STEPS),
    },
    CommandEntry {
        code: 0x5F16,
        name: "segment_type_set",
        description: "週內日時段切分設定",
        direction: Direction::Setting,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: SEGMENT_TYPE_SET_FIELDS,
        validator: Validator::MinLength(5),
        steps: Some(SEGMENT_TYPE_SET_STEPS),
    },
    CommandEntry {
        code: 0x5F46,
        name: "segment_type_query",
        description: "查詢週內日時段切分內容",
        direction: Direction::Query,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: SEGMENT_TYPE_QUERY_FIELDS,
        validator: Validator::ExactLength(3),
        steps: Some(SEGMENT_TYPE_QUERY_STEPS),
    },
    CommandEntry {
        code: 0x5FC6,
        name: "segment_type_reply",
        description: "週內日時段切分內容回報",
        direction: Direction::QueryReply,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: SEGMENT_TYPE_REPLY_FIELDS,
        validator: Validator::MinLength(5),
        steps: None,
    },
    CommandEntry {
        code: 0x0F40,
        name: "equipment_query",
        description: "查詢現場設備編號",
        direction: Direction::Query,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: EQUIPMENT_QUERY_FIELDS,
        validator: Validator::ExactLength(2),
        steps: Some(EQUIPMENT_QUERY_STEPS),
    },
    CommandEntry {
        code: 0x0F10,
        name: "field_reset",
        description: "現場設備重置",
        direction: Direction::Setting,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: FIELD_RESET_FIELDS,
        validator: Validator::ExactLength(4),
        steps: Some(FIELD_RESET_STEPS),
    },
    CommandEntry {
        code: 0x5F3F,
        name: "transmit_type_set",
        description: "傳輸型態及週期設定",
        direction: Direction::Setting,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: TRANSMIT_TYPE_FIELDS,
        validator: Validator::ExactLength(5),
        steps: Some(TRANSMIT_TYPE_STEPS),
    },
    CommandEntry {
        code: 0x5F13,
        name: "phase_layout_set",
        description: "設定時相排列",
        direction: Direction::Setting,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: PHASE_LAYOUT_SET_FIELDS,
        validator: Validator::MinLength(6),
        steps: Some(PHASE_LAYOUT_SET_STEPS),
    },
    CommandEntry {
        code: 0x5F43,
        name: "phase_layout_query",
        description: "查詢時相排列",
        direction: Direction::Query,
        needs_ack: false,
        log_modes: BOTH_MODES,
        fields: PHASE_LAYOUT_QUERY_FIELDS,
        validator: Validator::ExactLength(3),
        steps: Some(PHASE_LAYOUT_QUERY_STEPS),
    },
    CommandEntry {
        code: 0x5FC3,
        name: "phase_layout_reply",
        description: "時相排列回報",
        direction: Direction::QueryReply,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: PHASE_LAYOUT_REPLY_FIELDS,
        validator: Validator::MinLength(6),
        steps: None,
    },
    CommandEntry {
        code: 0x5F00,
        name: "control_strategy_async_report",
        description: "主動回報控制策略之目前執行內容",
        direction: Direction::AsyncReport,
        needs_ack: true,
        log_modes: BOTH_MODES,
        fields: CONTROL_STRATEGY_ASYNC_FIELDS,
        validator: Validator::ExactLength(4),
        steps: None,
    },
];

/// Look up a catalogue entry by its 16-bit command code.
#[must_use]
pub fn lookup(code: u16) -> Option<&'static CommandEntry> {
    CATALOGUE.iter().find(|e| e.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_required_code_present() {
        const REQUIRED: &[u16] = &[
            0x0F04, 0x0F80, 0x0F81, 0x5F08, 0x5F10, 0x5FC0, 0x5F40, 0x5F03, 0x5F0C, 0x5FC6,
            0x0FC0, 0x0F02, 0x5FC8, 0x5F18, 0x5F48, 0x5F16, 0x5F46, 0x0F40, 0x0F10, 0x5F3F,
            0x5F13, 0x5F43, 0x5FC3, 0x5F00,
        ];
        for code in REQUIRED {
            assert!(lookup(*code).is_some(), "missing catalogue entry for 0x{code:04X}");
        }
    }

    #[test]
    fn control_strategy_render_matches_scenario_3() {
        assert_eq!(render_control_strategy(0x03), "定時控制、動態控制 (0x03)");
    }

    #[test]
    fn hardware_status_empty_is_normal() {
        assert_eq!(render_hardware_status(0), "系統正常");
    }

    #[test]
    fn buildable_entries_have_steps() {
        for e in CATALOGUE {
            if e.direction.is_buildable() {
                assert!(e.steps.is_some(), "{} should declare build steps", e.name);
            }
        }
    }
}
