//! Schema-driven OpenAPI and client generation.
//!
//! The crate walks a described set of DTO shapes once per generation pass
//! and renders the resulting model two ways:
//!
//! - an OpenAPI 3.0 JSON document ([`ApiDefinition::openapi_document`])
//! - typed client sources for JavaScript, TypeScript, and Python
//!   ([`ApiDefinition::client`])
//!
//! Hosts describe their DTOs into a [`TypeGraph`] (the stand-in for runtime
//! reflection), register routes against it, and generate. All output is
//! deterministic: maps are sorted, services and methods are ordered, and a
//! repeated pass over unchanged inputs produces byte-identical artifacts.

mod client;
mod descriptor;
mod error;
mod openapi;
mod overrides;
mod query;
mod registry;
mod route;
mod util;

use std::collections::BTreeMap;

pub use client::render::{ClientArtifact, ClientLang, render_client};
pub use client::{ClientMethod, ClientService, ClientSpec, build_client_spec};
pub use descriptor::{FieldShape, MapKey, QueryBinding, Scalar, TypeGraph, TypeId, TypeKind};
pub use error::GenerateError;
pub use openapi::schema::{OpenApiSchema, SchemaGen};
pub use openapi::{
    OpenApiContact, OpenApiExternalDocs, OpenApiLicense, OpenApiOptions, OpenApiServer,
    OpenApiTag, build_document,
};
pub use overrides::TypeOverride;
pub use query::{QueryInfo, QueryParam, query_params_for};
pub use registry::{Field, Lang, Object, Registry};
pub use route::{GuardSpec, HandlerMeta, ResponseShape, Route, Verb};

/// A described API: the type graph, its routes, and generation settings.
///
/// Each generation call builds fresh per-pass state, so one definition can
/// produce the document and every client without cross-pass leakage.
#[derive(Debug, Default)]
pub struct ApiDefinition {
    graph: TypeGraph,
    routes: Vec<Route>,
    overrides: BTreeMap<String, TypeOverride>,
    openapi: OpenApiOptions,
}

impl ApiDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// The type graph backing this definition.
    pub fn graph(&mut self) -> &mut TypeGraph {
        &mut self.graph
    }

    /// Register a route from a `"VERB /path"` pattern. Patterns without a
    /// recognized verb are logged and skipped.
    pub fn route(
        &mut self,
        pattern: &str,
        meta: HandlerMeta,
        guards: Vec<GuardSpec>,
        request: Option<TypeId>,
        response: Option<ResponseShape>,
    ) -> &mut Self {
        if let Some(route) = Route::parse(pattern, meta, guards, request, response) {
            self.routes.push(route);
        }
        self
    }

    /// Replace the render overrides for external types.
    pub fn set_type_overrides(&mut self, overrides: BTreeMap<String, TypeOverride>) {
        self.overrides = overrides;
    }

    /// Replace the OpenAPI document settings.
    pub fn set_openapi_options(&mut self, options: OpenApiOptions) {
        self.openapi = options;
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Build the pretty-printed OpenAPI 3.0 document.
    pub fn openapi_document(&self) -> Result<Vec<u8>, GenerateError> {
        build_document(&self.graph, &self.routes, &self.overrides, &self.openapi)
    }

    /// Render a client for the target language.
    pub fn client(&self, lang: ClientLang) -> Result<ClientArtifact, GenerateError> {
        render_client(&self.graph, &self.routes, &self.overrides, lang)
    }
}
