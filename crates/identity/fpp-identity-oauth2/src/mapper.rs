//! Mapping of provider user-info payloads onto [`Profile`].

use crate::config::ProfileFieldMap;
use fpp_identity_core::Profile;
use serde_json::Value;

/// Turns a parsed user-info payload into a normalized profile.
///
/// Implementations fill `id`, `username` and `display_name` and must not fail
/// on missing fields. `provider`, `raw` and `json` are set by the strategy.
pub trait ProfileMapper: Send + Sync {
    fn map_profile(&self, json: &Value) -> Profile;
}

impl<F> ProfileMapper for F
where
    F: Fn(&Value) -> Profile + Send + Sync,
{
    fn map_profile(&self, json: &Value) -> Profile {
        self(json)
    }
}

impl ProfileMapper for ProfileFieldMap {
    fn map_profile(&self, json: &Value) -> Profile {
        Profile {
            id: first_string(json, &self.id_fields),
            username: first_string(json, &self.username_fields),
            display_name: first_string(json, &self.display_name_fields),
            ..Profile::default()
        }
    }
}

/// Reads the first field among `fields` holding a scalar, as a string.
///
/// Strings are taken verbatim and numbers and bools are rendered as JSON text.
/// Null, arrays and objects are skipped so later fields can still supply the
/// value. With no scalar field the result is empty.
pub fn first_string(json: &Value, fields: &[String]) -> String {
    fields
        .iter()
        .filter_map(|field| json.get(field))
        .find_map(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}
