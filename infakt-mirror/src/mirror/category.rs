use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;

use super::schema::RecordSchema;

static NUMERIC_IN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\.").expect("valid numeric id pattern"));
static UUID_IN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})\.")
        .expect("valid uuid pattern")
});
static UUID_EXACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid uuid pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPattern {
    Numeric,
    Uuid,
}

impl IdPattern {
    pub fn parse_value(self, value: &Value) -> Option<RemoteId> {
        match self {
            IdPattern::Numeric => value
                .as_u64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .map(|id| RemoteId(id.to_string())),
            IdPattern::Uuid => value
                .as_str()
                .map(str::trim)
                .filter(|s| UUID_EXACT.is_match(s))
                .map(|s| RemoteId(s.to_ascii_lowercase())),
        }
    }

    pub fn parse_file_name(self, file_name: &str) -> Option<RemoteId> {
        match self {
            IdPattern::Numeric => {
                let captures = NUMERIC_IN_NAME.captures(file_name)?;
                let id: u64 = captures.get(1)?.as_str().parse().ok()?;
                Some(RemoteId(id.to_string()))
            }
            IdPattern::Uuid => {
                let captures = UUID_IN_NAME.captures(file_name)?;
                Some(RemoteId(captures.get(1)?.as_str().to_ascii_lowercase()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRule {
    Id,
    Prefixed(&'static str),
}

impl NamingRule {
    // The id always stays last so it can be recovered from the file name.
    pub fn display_name(&self, id: &RemoteId, record: &Value, label: Option<&str>) -> String {
        let prefix = match self {
            NamingRule::Id => None,
            NamingRule::Prefixed(field) => record
                .get(*field)
                .and_then(scalar_text)
                .map(|prefix| prefix.trim().to_string())
                .filter(|prefix| !prefix.is_empty()),
        };
        let mut parts: Vec<String> = Vec::with_capacity(3);
        parts.extend(prefix);
        parts.extend(label.map(str::to_string));
        parts.push(id.to_string());
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Field(&'static str),
    Timestamp(&'static str),
}

impl SortKey {
    pub fn field(&self) -> &'static str {
        match self {
            SortKey::Field(field) | SortKey::Timestamp(field) => *field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentSpec {
    pub field: &'static str,
    pub fetch_separately: bool,
    pub name_field: &'static str,
    pub link_field: &'static str,
}

impl AttachmentSpec {
    pub fn listing_resource(&self, detail_resource: &str) -> String {
        format!("{detail_resource}/{}", self.field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLabel {
    pub field: &'static str,
    pub symbol: &'static str,
    pub label: &'static str,
}

impl StatusLabel {
    pub fn applies_to(&self, record: &Value) -> bool {
        record
            .get(self.field)
            .and_then(Value::as_array)
            .is_some_and(|statuses| {
                statuses
                    .iter()
                    .any(|status| status.get("symbol").and_then(Value::as_str) == Some(self.symbol))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailSpec {
    pub key_field: &'static str,
    pub schema: RecordSchema,
    pub attachments: Option<AttachmentSpec>,
    pub label: Option<StatusLabel>,
}

impl DetailSpec {
    pub const fn new(key_field: &'static str, schema: RecordSchema) -> Self {
        Self {
            key_field,
            schema,
            attachments: None,
            label: None,
        }
    }

    pub const fn with_attachments(mut self, attachments: AttachmentSpec) -> Self {
        self.attachments = Some(attachments);
        self
    }

    pub const fn with_label(mut self, label: StatusLabel) -> Self {
        self.label = Some(label);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpec {
    pub name: String,
    pub archive_dir: PathBuf,
    pub endpoint: String,
    pub page_size: u32,
    pub id_field: &'static str,
    pub id_pattern: IdPattern,
    pub sort: SortKey,
    pub naming: NamingRule,
    pub entity_schema: RecordSchema,
    pub detail: Option<DetailSpec>,
}

impl CategorySpec {
    pub fn remote_id(&self, record: &Value) -> Option<RemoteId> {
        self.id_pattern.parse_value(record.get(self.id_field)?)
    }

    pub fn detail_resource(&self, detail: &DetailSpec, record: &Value) -> Option<String> {
        let key = record.get(detail.key_field).and_then(scalar_text)?;
        let key = key.trim();
        if key.is_empty() || key.contains(['/', '?', '#']) {
            return None;
        }
        Some(format!("{}/{key}", self.endpoint.trim_matches('/')))
    }
}

pub fn sort_records<T>(items: &mut [T], key: SortKey, record: impl Fn(&T) -> &Value) {
    let field = key.field();
    items.sort_by(|a, b| {
        let (a, b) = (record(a).get(field), record(b).get(field));
        match key {
            SortKey::Field(_) => compare_values(a, b),
            SortKey::Timestamp(_) => compare_timestamps(a, b),
        }
    });
}

// Unparseable values sort before all timestamps, among themselves by value.
fn compare_timestamps(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => compare_values(a, b),
    }
}

fn parse_timestamp(value: Option<&Value>) -> Option<OffsetDateTime> {
    let text = value?.as_str()?.trim();
    OffsetDateTime::parse(
        text,
        format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
        ),
    )
    .ok()
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_u64(), y.as_u64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .unwrap_or_default()
                .total_cmp(&y.as_f64().unwrap_or_default()),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.map(Value::to_string).cmp(&b.map(Value::to_string))),
    }
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
