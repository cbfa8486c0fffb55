//! Resume record: the JSON-Resume shaped document that field mappings point into.
//!
//! The record is a base document (work history, skills, anything the user
//! keeps on file) with `basics` overlaid from the current Profile, so a
//! mapping such as `basics.phone` always sees the latest panel edits.

use serde_json::{json, Map, Value};

use crate::models::profile::Profile;

const LINKEDIN_NETWORK: &str = "LinkedIn";

/// Resolves a dot-delimited path (`basics.phone`, `work.0.company`) inside `record`.
///
/// Object segments are keys, array segments are zero-based indices.
/// Returns `None` for an empty path or segment, a step through a primitive,
/// or a `null` leaf.
pub fn resolve_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.trim().is_empty() {
        return None;
    }

    let mut current = record;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    (!current.is_null()).then_some(current)
}

/// Text form of a resolved value as it is written into a page field.
/// Strings are used verbatim; anything else keeps its JSON rendering.
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds the resume record from an optional base document and the profile.
/// Empty profile fields never overwrite values already present in the base.
pub fn build_resume_record(base: Option<&Value>, profile: &Profile) -> Value {
    let mut root = match base {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    let info = &profile.personal_info;
    let basics = object_entry(&mut root, "basics");

    let name = info.full_name();
    set_if_present(basics, "name", &name);
    set_if_present(basics, "label", &info.current_title);
    set_if_present(basics, "email", &info.email);
    set_if_present(basics, "phone", &info.phone);
    set_if_present(basics, "url", &info.portfolio_url);

    if !info.city.trim().is_empty() || !info.country.trim().is_empty() {
        let location = object_entry(basics, "location");
        set_if_present(location, "city", &info.city);
        set_if_present(location, "countryCode", &info.country);
    }

    if !info.linkedin_url.trim().is_empty() {
        upsert_linkedin(basics, &info.linkedin_url);
    }

    Value::Object(root)
}

fn set_if_present(map: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.trim().is_empty() {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Returns the object stored under `key`, replacing any non-object value.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just set to an object"),
    }
}

fn upsert_linkedin(basics: &mut Map<String, Value>, url: &str) {
    let profiles = basics
        .entry("profiles".to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !profiles.is_array() {
        *profiles = Value::Array(Vec::new());
    }
    let Some(profiles) = profiles.as_array_mut() else {
        return;
    };

    let existing = profiles.iter().position(|p| {
        p.get("network")
            .and_then(Value::as_str)
            .is_some_and(|n| n.eq_ignore_ascii_case(LINKEDIN_NETWORK))
    });

    match existing {
        Some(index) if profiles[index].is_object() => {
            profiles[index]["url"] = Value::String(url.to_string());
        }
        _ => profiles.push(json!({ "network": LINKEDIN_NETWORK, "url": url })),
    }
}
