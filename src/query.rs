//! Request-field classification: query parameters vs body fields.
//!
//! A request DTO splits into query-bound fields and body fields. Query
//! parameters are restricted to scalars and flat lists of scalars; anything
//! structured must travel in the body. Classification errors name the object
//! and field so the defect is attributable from the build log.

use std::collections::HashSet;

use serde::Serialize;

use crate::descriptor::{FieldShape, Scalar, TypeGraph, TypeId, TypeKind};
use crate::error::GenerateError;

/// A single query parameter extracted from a request DTO.
#[derive(Debug, Clone, Serialize)]
pub struct QueryParam {
    pub name: String,
    pub optional: bool,
    pub is_array: bool,
    pub doc: String,
}

/// Classification result for one request DTO.
#[derive(Debug, Clone, Default)]
pub struct QueryInfo {
    pub params: Vec<QueryParam>,
    /// Declared names of query-bound fields, for body-side exclusion.
    pub query_field_set: HashSet<String>,
    /// Count of serializable non-query fields.
    pub body_fields: usize,
}

impl QueryInfo {
    pub fn has_body(&self) -> bool {
        self.body_fields > 0
    }
}

/// Split a request type's fields into query parameters and body fields.
///
/// Non-struct request types count as one opaque body field so the request
/// still produces a body in the document.
pub fn query_params_for(graph: &TypeGraph, id: TypeId) -> Result<QueryInfo, GenerateError> {
    let (base, _) = graph.deref(id);
    let TypeKind::Struct(shape) = graph.kind(base) else {
        return Ok(QueryInfo {
            body_fields: 1,
            ..QueryInfo::default()
        });
    };

    let mut info = QueryInfo::default();
    for field in &shape.fields {
        if field.ignored {
            continue;
        }
        if field.query.is_some() {
            let param = classify_query_field(graph, &shape.name, field)?;
            info.query_field_set.insert(field.name.clone());
            info.params.push(param);
            continue;
        }
        if field.resolved_wire_name().is_some() {
            info.body_fields += 1;
        }
    }
    Ok(info)
}

fn classify_query_field(
    graph: &TypeGraph,
    object: &str,
    field: &FieldShape,
) -> Result<QueryParam, GenerateError> {
    let classification_error = |reason: &str| GenerateError::QueryClassification {
        object: object.to_string(),
        field: field.name.clone(),
        reason: reason.to_string(),
    };

    if field.wire_name.is_some() {
        return Err(classification_error(
            "query params cannot also carry a body wire name",
        ));
    }
    let Some(name) = field.query_param_name() else {
        return Err(classification_error("missing query binding"));
    };

    let (base, _) = graph.deref(field.ty);
    let is_array = match graph.kind(base) {
        TypeKind::Struct(_) => return Err(classification_error("structs are not supported")),
        TypeKind::Map { .. } => return Err(classification_error("maps are not supported")),
        TypeKind::Scalar(Scalar::Any) => {
            return Err(classification_error("untyped values are not supported"));
        }
        TypeKind::List(elem) => {
            let (elem_base, _) = graph.deref(*elem);
            match graph.kind(elem_base) {
                TypeKind::Scalar(Scalar::Any) | TypeKind::Struct(_) | TypeKind::Map { .. }
                | TypeKind::List(_) => {
                    return Err(classification_error("unsupported list element type"));
                }
                _ => true,
            }
        }
        _ => false,
    };

    let optional = field.query.as_ref().is_some_and(|binding| binding.optional);
    Ok(QueryParam {
        name,
        optional,
        is_array,
        doc: field.doc.clone(),
    })
}
