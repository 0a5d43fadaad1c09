//! Loader for ChatGPT-style `conversations.json` exports.
//!
//! The raw export is a loosely structured tree of message nodes. It is mapped
//! once into [`Conversation`] values with every defaulting rule applied here,
//! so downstream code never has to re-check field presence.

use crate::error::{FieldParseError, LoadError};
use crate::types::{Conversation, Message, Role, UNKNOWN_MODEL};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

// Every raw field is read leniently: a value of the wrong type reads as absent
// instead of failing the whole record.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConversation {
    #[serde(deserialize_with = "lenient")]
    conversation_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,
    create_time: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    default_model_slug: Option<String>,
    /// Node values are checked one at a time during flattening.
    #[serde(deserialize_with = "lenient")]
    mapping: Option<BTreeMap<String, Value>>,
    #[serde(deserialize_with = "lenient")]
    messages: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNode {
    message: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    parent: Option<String>,
    #[serde(deserialize_with = "string_list")]
    children: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMessage {
    #[serde(deserialize_with = "lenient")]
    author: Option<RawAuthor>,
    create_time: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    content: Option<RawContent>,
    #[serde(deserialize_with = "lenient")]
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuthor {
    #[serde(deserialize_with = "lenient")]
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawContent {
    #[serde(deserialize_with = "lenient")]
    parts: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient")]
    text: Option<String>,
}

impl RawContent {
    /// Text parts joined by newlines; non-text parts (images, files) are dropped.
    fn into_text(self) -> String {
        match self.parts {
            Some(parts) => parts
                .into_iter()
                .filter_map(|part| match part {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
            None => self.text.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    #[serde(deserialize_with = "lenient")]
    model_slug: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// String entries of a list; anything else in the list is ignored.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// A message value from the export: `None` for null, an error for anything
/// that is not an object.
fn raw_message(value: Value) -> Result<Option<RawMessage>, FieldParseError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| FieldParseError::MalformedMessage(e.to_string())),
        other => Err(FieldParseError::MalformedMessage(other.to_string())),
    }
}

/// Tallies of what the loader had to recover from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub conversations: usize,
    pub messages: usize,
    /// Conversations whose creation time was missing or malformed.
    pub undated_conversations: usize,
    /// Messages whose timestamp was missing or malformed.
    pub undated_messages: usize,
    pub missing_roles: usize,
    /// Message nodes dropped because they were not objects.
    pub malformed_messages: usize,
    /// Records in the conversation list that were not conversation objects.
    pub skipped_records: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedExport {
    pub conversations: Vec<Conversation>,
    pub report: LoadReport,
}

/// Read and parse an export file.
pub fn load_export(path: &Path) -> Result<LoadedExport, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let export = parse_export(&contents)?;
    tracing::info!(
        "Loaded {} conversations ({} messages) from {}",
        export.report.conversations,
        export.report.messages,
        path.display()
    );
    Ok(export)
}

/// Parse an export held in memory.
///
/// The top level must be a list of conversations, or an object carrying that
/// list under `"conversations"`.
pub fn parse_export(json: &str) -> Result<LoadedExport, LoadError> {
    let root: Value = serde_json::from_str(json)?;
    let records = match root {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("conversations") {
            Some(Value::Array(items)) => items,
            _ => return Err(LoadError::MissingConversationList),
        },
        _ => return Err(LoadError::MissingConversationList),
    };

    let mut report = LoadReport::default();
    let mut conversations = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        if !record.is_object() {
            tracing::warn!("Skipping conversation record {}: not an object", index);
            report.skipped_records += 1;
            continue;
        }
        match serde_json::from_value::<RawConversation>(record) {
            Ok(raw) => conversations.push(build_conversation(raw, index, &mut report)),
            Err(e) => {
                tracing::warn!("Skipping conversation record {}: {}", index, e);
                report.skipped_records += 1;
            }
        }
    }
    report.conversations = conversations.len();

    if report.undated_messages > 0 || report.undated_conversations > 0 {
        tracing::warn!(
            "{} messages and {} conversations have unparsable timestamps",
            report.undated_messages,
            report.undated_conversations
        );
    }

    Ok(LoadedExport {
        conversations,
        report,
    })
}

fn build_conversation(raw: RawConversation, index: usize, report: &mut LoadReport) -> Conversation {
    let id = raw
        .conversation_id
        .or(raw.id)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("conversation-{}", index));
    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "Untitled".into());

    let created_at = match parse_timestamp(raw.create_time.as_ref()) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::debug!(conversation = %id, "creation time unusable: {}", e);
            report.undated_conversations += 1;
            None
        }
    };

    let values = match (raw.mapping, raw.messages) {
        (Some(mapping), _) => flatten_mapping(mapping, &id, report),
        (None, Some(list)) => list,
        (None, None) => Vec::new(),
    };
    let raw_messages: Vec<RawMessage> = values
        .into_iter()
        .filter_map(|value| match raw_message(value) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(conversation = %id, "{}", e);
                report.malformed_messages += 1;
                None
            }
        })
        .collect();

    let mut slugs: HashMap<String, usize> = HashMap::new();
    let mut messages = Vec::with_capacity(raw_messages.len());

    for raw_msg in raw_messages {
        if let Some(slug) = raw_msg
            .metadata
            .and_then(|m| m.model_slug)
            .filter(|s| !s.is_empty())
        {
            *slugs.entry(slug).or_insert(0) += 1;
        }

        let role = match raw_msg.author.and_then(|a| a.role) {
            Some(tag) => Role::from_tag(&tag),
            None => {
                tracing::debug!(conversation = %id, "{}", FieldParseError::MissingRole);
                report.missing_roles += 1;
                Role::Other
            }
        };

        let timestamp = match parse_timestamp(raw_msg.create_time.as_ref()) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::debug!(conversation = %id, "message timestamp unusable: {}", e);
                report.undated_messages += 1;
                None
            }
        };

        let content = raw_msg.content.map(RawContent::into_text).unwrap_or_default();
        messages.push(Message::new(role, timestamp, content));
    }

    // Stable: equal timestamps keep tree order, untimestamped messages lead.
    messages.sort_by_key(|m| m.timestamp);
    report.messages += messages.len();

    let model = raw
        .default_model_slug
        .filter(|s| !s.is_empty())
        .or_else(|| dominant_model(slugs))
        .unwrap_or_else(|| UNKNOWN_MODEL.to_string());

    Conversation {
        id,
        title,
        created_at,
        model,
        messages,
    }
}

/// Most frequent model slug; ties go to the lexically smallest slug.
fn dominant_model(slugs: HashMap<String, usize>) -> Option<String> {
    slugs
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(slug, _)| slug)
}

/// Depth-first walk of the message tree from its roots, honouring child order.
///
/// Nodes unreachable from a root (cycles in a corrupt export) are appended in
/// id order so no message is lost. Nodes that are not objects are dropped.
fn flatten_mapping(raw: BTreeMap<String, Value>, conversation: &str, report: &mut LoadReport) -> Vec<Value> {
    let mut mapping: BTreeMap<String, RawNode> = BTreeMap::new();
    for (id, value) in raw {
        if !value.is_object() {
            tracing::debug!(conversation, node = %id, "{}", FieldParseError::MalformedMessage(value.to_string()));
            report.malformed_messages += 1;
            continue;
        }
        if let Ok(node) = serde_json::from_value::<RawNode>(value) {
            mapping.insert(id, node);
        }
    }

    let roots: Vec<String> = mapping
        .iter()
        .filter(|(_, node)| {
            node.parent
                .as_ref()
                .map_or(true, |parent| !mapping.contains_key(parent))
        })
        .map(|(id, _)| id.clone())
        .collect();
    let starts: Vec<String> = roots.into_iter().chain(mapping.keys().cloned()).collect();

    let mut visited: HashSet<String> = HashSet::with_capacity(mapping.len());
    let mut order = Vec::with_capacity(mapping.len());

    for start in starts {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = mapping.get(&id) else {
                continue;
            };
            if !visited.insert(id.clone()) {
                continue;
            }
            for child in node.children.iter().rev() {
                if !visited.contains(child) && mapping.contains_key(child) {
                    stack.push(child.clone());
                }
            }
            order.push(id);
        }
    }

    order
        .into_iter()
        .filter_map(|id| mapping.remove(&id).and_then(|node| node.message))
        .collect()
}

/// Earliest and latest accepted instants: 1970-01-01 and 9999-12-31T23:59:59 UTC.
const EPOCH_RANGE: std::ops::RangeInclusive<i64> = 0..=253_402_300_799;

/// Parse an export timestamp: epoch seconds (number or numeric string) or RFC 3339.
///
/// Instants outside [`EPOCH_RANGE`] are rejected; they come from corrupt
/// values or millisecond epochs and would stretch every time series.
fn parse_timestamp(value: Option<&Value>) -> Result<DateTime<Utc>, FieldParseError> {
    match value {
        None | Some(Value::Null) => Err(FieldParseError::MissingTimestamp),
        Some(Value::Number(n)) => n
            .as_f64()
            .and_then(from_epoch_secs)
            .ok_or_else(|| FieldParseError::InvalidTimestamp(n.to_string())),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(FieldParseError::MissingTimestamp);
            }
            match s.parse::<f64>() {
                Ok(secs) => {
                    from_epoch_secs(secs).ok_or_else(|| FieldParseError::InvalidTimestamp(s.into()))
                }
                Err(_) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
                    .filter(|dt| EPOCH_RANGE.contains(&dt.timestamp()))
                    .ok_or_else(|| FieldParseError::InvalidTimestamp(s.into())),
            }
        }
        Some(other) => Err(FieldParseError::InvalidTimestamp(other.to_string())),
    }
}

fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole < *EPOCH_RANGE.start() as f64 || whole > *EPOCH_RANGE.end() as f64 {
        return None;
    }
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2024-03-04 10:00:00 UTC (a Monday, ISO week 2024-W10).
    const T0: f64 = 1_709_546_400.0;

    fn node(message: Value, parent: Option<&str>, children: &[&str]) -> Value {
        serde_json::json!({
            "message": message,
            "parent": parent,
            "children": children,
        })
    }

    fn msg(role: &str, time: Value, text: &str, model: Option<&str>) -> Value {
        serde_json::json!({
            "author": { "role": role },
            "create_time": time,
            "content": { "content_type": "text", "parts": [text] },
            "metadata": { "model_slug": model },
            "status": "finished_successfully",
        })
    }

    fn sample_export() -> String {
        serde_json::json!([
            {
                "title": "Rust lifetimes",
                "conversation_id": "conv-1",
                "create_time": T0,
                "mapping": {
                    "root": node(Value::Null, None, &["sys"]),
                    "sys": node(msg("system", Value::Null, "", None), Some("root"), &["u1"]),
                    "u1": node(msg("user", T0.into(), "hi", None), Some("sys"), &["a1"]),
                    "a1": node(msg("assistant", (T0 + 5.0).into(), "hello", Some("gpt-4")), Some("u1"), &[]),
                },
                "moderation_results": [],
            }
        ])
        .to_string()
    }

    #[test]
    fn test_parse_chatgpt_tree() {
        let export = parse_export(&sample_export()).unwrap();
        assert_eq!(export.conversations.len(), 1);

        let conv = &export.conversations[0];
        assert_eq!(conv.id, "conv-1");
        assert_eq!(conv.title, "Rust lifetimes");
        assert_eq!(conv.model, "gpt-4");
        assert_eq!(conv.created_at, Some(Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()));

        let roles: Vec<Role> = conv.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert!(conv.messages[0].timestamp.is_none());
        assert_eq!(conv.messages[2].content, "hello");

        assert_eq!(export.report.messages, 3);
        assert_eq!(export.report.undated_messages, 1);
        assert_eq!(export.report.undated_conversations, 0);
    }

    #[test]
    fn test_messages_sorted_chronologically() {
        let json = serde_json::json!([{
            "id": "c",
            "create_time": T0,
            "mapping": {
                "a": node(msg("user", (T0 + 60.0).into(), "later", None), None, &["b"]),
                "b": node(msg("assistant", T0.into(), "earlier", None), Some("a"), &[]),
            }
        }])
        .to_string();
        let export = parse_export(&json).unwrap();
        let texts: Vec<&str> = export.conversations[0]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(texts, vec!["earlier", "later"]);
    }

    #[test]
    fn test_empty_export() {
        let export = parse_export("[]").unwrap();
        assert!(export.conversations.is_empty());
        assert_eq!(export.report, LoadReport::default());
    }

    #[test]
    fn test_wrapped_conversation_list() {
        let json = serde_json::json!({ "conversations": [{ "id": "x" }] }).to_string();
        let export = parse_export(&json).unwrap();
        assert_eq!(export.conversations.len(), 1);
        assert_eq!(export.conversations[0].id, "x");
        assert_eq!(export.conversations[0].title, "Untitled");
    }

    #[test]
    fn test_top_level_not_a_list() {
        assert!(matches!(
            parse_export(r#"{"title": "nope"}"#),
            Err(LoadError::MissingConversationList)
        ));
        assert!(matches!(parse_export("42"), Err(LoadError::MissingConversationList)));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse_export("{not json"), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_missing_model_is_unknown() {
        let json = serde_json::json!([{
            "id": "c",
            "create_time": T0,
            "mapping": { "u": node(msg("user", T0.into(), "hi", None), None, &[]) }
        }])
        .to_string();
        let export = parse_export(&json).unwrap();
        assert_eq!(export.conversations[0].model, UNKNOWN_MODEL);
    }

    #[test]
    fn test_default_model_slug_wins() {
        let json = serde_json::json!([{
            "id": "c",
            "default_model_slug": "gpt-4o",
            "mapping": { "a": node(msg("assistant", T0.into(), "x", Some("gpt-4")), None, &[]) }
        }])
        .to_string();
        let export = parse_export(&json).unwrap();
        assert_eq!(export.conversations[0].model, "gpt-4o");
    }

    #[test]
    fn test_dominant_model_tie_breaks_lexically() {
        let mut slugs = HashMap::new();
        slugs.insert("gpt-4".to_string(), 2);
        slugs.insert("gpt-3.5".to_string(), 2);
        slugs.insert("o1".to_string(), 1);
        assert_eq!(dominant_model(slugs), Some("gpt-3.5".to_string()));
        assert_eq!(dominant_model(HashMap::new()), None);
    }

    #[test]
    fn test_malformed_timestamps_are_recovered() {
        let json = serde_json::json!([{
            "id": "c",
            "create_time": "yesterday",
            "messages": [
                msg("user", "not a time".into(), "a", None),
                msg("assistant", (T0 + 1.0).into(), "b", None),
                { "create_time": T0, "content": { "parts": ["no author"] } },
            ]
        }])
        .to_string();
        let export = parse_export(&json).unwrap();
        let conv = &export.conversations[0];
        assert!(conv.created_at.is_none());
        assert_eq!(conv.messages.len(), 3);
        assert_eq!(export.report.undated_conversations, 1);
        assert_eq!(export.report.undated_messages, 1);
        assert_eq!(export.report.missing_roles, 1);
        assert_eq!(conv.messages.iter().filter(|m| m.role == Role::Other).count(), 1);
    }

    #[test]
    fn test_unknown_role_maps_to_other() {
        let json = serde_json::json!([{
            "id": "c",
            "messages": [msg("tool", T0.into(), "output", None)]
        }])
        .to_string();
        let export = parse_export(&json).unwrap();
        assert_eq!(export.conversations[0].messages[0].role, Role::Other);
    }

    #[test]
    fn test_non_object_records_are_skipped() {
        let json = serde_json::json!([7, { "id": "ok" }]).to_string();
        let export = parse_export(&json).unwrap();
        assert_eq!(export.conversations.len(), 1);
        assert_eq!(export.report.skipped_records, 1);
    }

    #[test]
    fn test_flatten_handles_cycles_and_dangling_parents() {
        let json = serde_json::json!([{
            "id": "c",
            "mapping": {
                "a": node(msg("user", T0.into(), "a", None), Some("b"), &["b"]),
                "b": node(msg("assistant", T0.into(), "b", None), Some("a"), &["a"]),
                "c": node(msg("user", T0.into(), "c", None), Some("missing"), &[]),
            }
        }])
        .to_string();
        let export = parse_export(&json).unwrap();
        let texts: Vec<&str> = export.conversations[0]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp(Some(&Value::from(T0))), Ok(expected));
        assert_eq!(parse_timestamp(Some(&Value::from("1709546400"))), Ok(expected));
        assert_eq!(
            parse_timestamp(Some(&Value::from("2024-03-04T12:00:00+02:00"))),
            Ok(expected)
        );
        assert_eq!(parse_timestamp(None), Err(FieldParseError::MissingTimestamp));
        assert_eq!(
            parse_timestamp(Some(&Value::Null)),
            Err(FieldParseError::MissingTimestamp)
        );
        assert!(matches!(
            parse_timestamp(Some(&Value::from("NaN"))),
            Err(FieldParseError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            parse_timestamp(Some(&Value::Bool(true))),
            Err(FieldParseError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_fractional_epoch_seconds() {
        let ts = parse_timestamp(Some(&Value::from(T0 + 0.5))).unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_load_export_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_export(&dir.path().join("conversations.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_load_export_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("conversations.json");
        std::fs::write(&path, sample_export()).unwrap();
        let export = load_export(&path).unwrap();
        assert_eq!(export.report.conversations, 1);
    }

    #[test]
    fn test_wrong_typed_fields_keep_conversation() {
        let json = serde_json::json!([
            {
                "id": "bad-title",
                "title": 5,
                "create_time": T0,
                "messages": [msg("user", T0.into(), "hi", None)]
            },
            {
                "id": "bad-node",
                "create_time": T0,
                "default_model_slug": ["gpt-4"],
                "mapping": {
                    "a": node(Value::from("oops"), None, &["b"]),
                    "b": node(msg("user", T0.into(), "kept", None), Some("a"), &[]),
                    "c": 17,
                }
            },
            {
                "id": "bad-content",
                "messages": [
                    {
                        "author": "user",
                        "create_time": T0,
                        "content": { "text": 42 },
                        "metadata": "none"
                    },
                    "not a message"
                ]
            }
        ])
        .to_string();
        let export = parse_export(&json).unwrap();

        assert_eq!(export.conversations.len(), 3);
        assert_eq!(export.report.conversations, 3);
        assert_eq!(export.report.skipped_records, 0);
        assert_eq!(export.report.malformed_messages, 3);

        let title = &export.conversations[0];
        assert_eq!(title.title, "Untitled");
        assert_eq!(title.messages.len(), 1);
        assert_eq!(title.messages[0].role, Role::User);

        let tree = &export.conversations[1];
        assert_eq!(tree.model, UNKNOWN_MODEL);
        assert_eq!(tree.messages.len(), 1);
        assert_eq!(tree.messages[0].content, "kept");

        let content = &export.conversations[2];
        assert_eq!(content.messages.len(), 1);
        assert_eq!(content.messages[0].role, Role::Other);
        assert_eq!(content.messages[0].content, "");
        assert!(content.messages[0].timestamp.is_some());
        assert_eq!(export.report.missing_roles, 1);
        assert_eq!(export.report.messages, 3);
    }

    #[test]
    fn test_non_string_children_are_ignored() {
        let json = serde_json::json!([{
            "id": "c",
            "mapping": {
                "a": { "message": msg("user", T0.into(), "a", None), "children": ["b", 3, null] },
                "b": node(msg("assistant", (T0 + 1.0).into(), "b", None), Some("a"), &[]),
            }
        }])
        .to_string();
        let export = parse_export(&json).unwrap();
        let texts: Vec<&str> = export.conversations[0]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_timestamps_outside_supported_range() {
        for value in [
            Value::from(1_709_546_400_000.0),
            Value::from(-1.0),
            Value::from(1e300),
            Value::from("1709546400000"),
            Value::from("-62135596800"),
            Value::from("0001-01-01T00:00:00Z"),
            Value::from("1969-12-31T23:59:59Z"),
        ] {
            assert!(
                matches!(parse_timestamp(Some(&value)), Err(FieldParseError::InvalidTimestamp(_))),
                "{value}"
            );
        }

        let first = parse_timestamp(Some(&Value::from(0))).unwrap();
        assert_eq!(first, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
        let last = parse_timestamp(Some(&Value::from(253_402_300_799i64))).unwrap();
        assert_eq!(last, Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_millisecond_epoch_leaves_conversation_undated() {
        let json = serde_json::json!([
            { "id": "a", "create_time": T0, "messages": [msg("user", T0.into(), "x", None)] },
            {
                "id": "b",
                "create_time": T0 * 1000.0,
                "messages": [msg("user", (T0 * 1000.0).into(), "y", None)]
            }
        ])
        .to_string();
        let export = parse_export(&json).unwrap();
        assert_eq!(export.conversations.len(), 2);
        assert!(export.conversations[1].created_at.is_none());
        assert!(export.conversations[1].messages[0].timestamp.is_none());
        assert_eq!(export.report.undated_conversations, 1);
        assert_eq!(export.report.undated_messages, 1);
    }
}
