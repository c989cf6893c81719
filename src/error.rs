//! Error taxonomy for the generation pipeline.
//!
//! All failures are local to one generation pass and reflect defects in the
//! service's DTO definitions rather than transient conditions, so nothing is
//! retried: the error is propagated to the caller as a build failure.

use thiserror::Error;

/// Errors raised while building schema documents or client sources.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Two distinct type descriptors resolved to the same canonical name.
    ///
    /// Intentionally unrecoverable: arbitrarily picking a winner would
    /// silently corrupt generated schemas for one of the two shapes.
    #[error("schema name collision for {name}")]
    NameCollision { name: String },

    /// A route was registered without a response shape.
    #[error("response type is required for {pattern}")]
    MissingResponseType { pattern: String },

    /// A request DTO field is tagged ambiguously or a query parameter has an
    /// unsupported shape.
    #[error("query param {object}.{field}: {reason}")]
    QueryClassification {
        object: String,
        field: String,
        reason: String,
    },

    /// The OpenAPI document failed to serialize.
    #[error("failed to encode OpenAPI document: {0}")]
    Encode(#[from] serde_json::Error),

    /// A client template failed to compile or render.
    #[error("failed to render client template: {0}")]
    Template(#[from] tera::Error),

    /// Reading or writing a generated artifact failed.
    #[error("artifact i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
