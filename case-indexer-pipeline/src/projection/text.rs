//! Rendering of free-form JSON values into projection text.
//!
//! Absent paths are `Value::Null` after deserialization and render as empty
//! text. Lists are flattened; `null` and empty-string entries are dropped.

use serde_json::Value;

/// Separator between the steps of a five-whys chain.
pub const WHY_SEPARATOR: &str = " → ";

/// Separator between the causes of one fishbone category.
pub const CAUSE_SEPARATOR: &str = ", ";

/// Render a value as one line of text.
///
/// Strings as-is, numbers and booleans stringified, objects as compact JSON.
/// Arrays are flattened and newline-joined.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => value.to_string(),
        Value::Array(items) => join_text(flatten(items)),
    }
}

/// Flatten values into a list of strings, dropping `null` and empty strings.
pub fn flatten<'a>(values: impl IntoIterator<Item = &'a Value>) -> Vec<String> {
    let mut out = Vec::new();
    for value in values {
        flatten_into(value, &mut out);
    }
    out
}

fn flatten_into(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) if s.is_empty() => {}
        Value::Array(items) => items.iter().for_each(|item| flatten_into(item, out)),
        other => out.push(scalar_text(other)),
    }
}

/// Trim every part, drop blanks, join with newlines.
pub fn join_text<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter_map(|part| {
            let trimmed = part.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join the `label` field of each record, one per line.
///
/// Non-object entries and records without the label are ignored.
pub fn join_labels(records: &Value, label: &str) -> String {
    let Value::Array(items) = records else {
        return String::new();
    };

    join_text(
        items
            .iter()
            .filter_map(|item| item.as_object()?.get(label))
            .map(scalar_text),
    )
}

/// Object entries sorted by key, independent of map ordering.
fn sorted_entries(map: &serde_json::Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Render fishbone categories as `CATEGORY: cause, cause`, one line per category.
///
/// Categories are emitted in key order; categories without causes are omitted.
pub fn render_fishbone(fishbone: &Value) -> String {
    match fishbone {
        Value::Object(map) => join_text(sorted_entries(map).into_iter().filter_map(|(category, causes)| {
            let causes = flatten(std::iter::once(causes));
            let causes: Vec<&str> = causes.iter().map(|c| c.trim()).filter(|c| !c.is_empty()).collect();
            (!causes.is_empty()).then(|| {
                format!("{}: {}", category.trim().to_uppercase(), causes.join(CAUSE_SEPARATOR))
            })
        })),
        other => join_text(flatten(std::iter::once(other))),
    }
}

/// Render five-whys chains as `name: why → why → why`, one line per chain.
///
/// Chains may be keyed by name (object) or positional (array of lists).
pub fn render_five_whys(five_whys: &Value) -> String {
    fn chain(steps: &Value) -> String {
        flatten(std::iter::once(steps))
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(WHY_SEPARATOR)
    }

    match five_whys {
        Value::Object(map) => join_text(sorted_entries(map).into_iter().filter_map(|(name, steps)| {
            let rendered = chain(steps);
            (!rendered.is_empty()).then(|| format!("{}: {}", name.trim(), rendered))
        })),
        Value::Array(chains) if chains.iter().any(Value::is_array) => {
            join_text(chains.iter().map(chain))
        }
        other => chain(other),
    }
}
