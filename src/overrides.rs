//! Render overrides for well-known external types.
//!
//! An override short-circuits structural expansion entirely: the type is
//! treated as an opaque scalar and rendered from the hints below instead of
//! being walked field by field.

use std::collections::BTreeMap;

use crate::descriptor::{TypeGraph, TypeId};

/// Scalar render hints per output target. Any populated hint suppresses
/// structural walking for the matched type.
#[derive(Debug, Clone, Default)]
pub struct TypeOverride {
    pub js_type: Option<String>,
    pub py_type: Option<String>,
    pub openapi_type: Option<String>,
    pub openapi_format: Option<String>,
}

/// Layer caller-supplied overrides over the built-in defaults.
pub(crate) fn merge_type_overrides(
    user: &BTreeMap<String, TypeOverride>,
) -> BTreeMap<String, TypeOverride> {
    let mut merged = default_type_overrides();
    for (key, value) in user {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn default_type_overrides() -> BTreeMap<String, TypeOverride> {
    BTreeMap::from([
        (
            "chrono::DateTime".to_string(),
            TypeOverride {
                js_type: Some("string".to_string()),
                py_type: Some("datetime".to_string()),
                openapi_type: Some("string".to_string()),
                openapi_format: Some("date-time".to_string()),
            },
        ),
        (
            "serde_json::Value".to_string(),
            TypeOverride {
                js_type: Some("any".to_string()),
                py_type: Some("Any".to_string()),
                openapi_type: Some("object".to_string()),
                openapi_format: None,
            },
        ),
    ])
}

/// Look up an override for a type, trying the qualified name first and the
/// bare declared name second.
pub(crate) fn override_for<'a>(
    overrides: &'a BTreeMap<String, TypeOverride>,
    graph: &TypeGraph,
    id: TypeId,
) -> Option<&'a TypeOverride> {
    if let Some(qualified) = graph.qualified_name(id)
        && let Some(entry) = overrides.get(&qualified)
    {
        return Some(entry);
    }
    let name = graph.struct_name(id)?;
    overrides.get(name)
}

/// True when the type has any client-facing render hint.
pub(crate) fn is_override_scalar(
    overrides: &BTreeMap<String, TypeOverride>,
    graph: &TypeGraph,
    id: TypeId,
) -> bool {
    override_for(overrides, graph, id).is_some_and(|entry| {
        entry.js_type.is_some()
            || entry.py_type.is_some()
            || entry.openapi_type.is_some()
            || entry.openapi_format.is_some()
    })
}
