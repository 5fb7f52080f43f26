//! Normalization of FPP user-info documents.

use fpp_identity_core::Profile;
use fpp_identity_oauth2::{ProfileFieldMap, ProfileMapper};
use serde_json::Value;

/// Fields of the FPP `/api/userinfo` document that feed the profile.
pub fn field_map() -> ProfileFieldMap {
    ProfileFieldMap {
        id_fields: vec!["id".to_string()],
        username_fields: vec!["username".to_string()],
        display_name_fields: vec!["name".to_string(), "displayName".to_string()],
    }
}

/// Map an FPP user-info document onto a [`Profile`].
///
/// Never fails: absent fields become empty strings. `provider`, `raw` and
/// `json` are left for the strategy to fill.
pub fn parse(json: &Value) -> Profile {
    field_map().map_profile(json)
}
