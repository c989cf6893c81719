//! Route descriptions: the operation surface documents are generated from.
//!
//! A route pairs a `"VERB /path"` pattern with the request and response
//! descriptors of its handler. Patterns without a recognized verb prefix are
//! logged and excluded from documentation output; everything else flows into
//! both the OpenAPI document and the generated clients.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::descriptor::TypeId;
use crate::util::camelize_down;

/// HTTP verbs accepted in route patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Verb::Get),
            "HEAD" => Some(Verb::Head),
            "POST" => Some(Verb::Post),
            "PUT" => Some(Verb::Put),
            "PATCH" => Some(Verb::Patch),
            "DELETE" => Some(Verb::Delete),
            "OPTIONS" => Some(Verb::Options),
            _ => None,
        }
    }
}

/// Auth requirement attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuardSpec {
    /// Security scheme name; empty guards are dropped.
    pub name: String,
    /// Where the credential travels, e.g. `header`.
    pub location: String,
    /// Header or parameter carrying the credential.
    pub param: String,
    /// Literal prefix prepended to the credential, e.g. `Bearer `.
    pub prefix: String,
}

/// Documentation metadata for a handler. Empty `service`/`method` are
/// inferred from the route pattern at registration.
#[derive(Debug, Clone, Default)]
pub struct HandlerMeta {
    pub service: String,
    pub method: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Response descriptor for a route.
#[derive(Debug, Clone, Copy)]
pub enum ResponseShape {
    /// A structured payload.
    Object(TypeId),
    /// Explicit 200 with no body.
    Empty200,
    /// Explicit 204 with no body.
    Empty204,
    /// Explicit 500 with no body.
    Empty500,
}

impl ResponseShape {
    pub(crate) fn type_id(self) -> Option<TypeId> {
        match self {
            ResponseShape::Object(id) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn status(self) -> &'static str {
        match self {
            ResponseShape::Object(_) | ResponseShape::Empty200 => "200",
            ResponseShape::Empty204 => "204",
            ResponseShape::Empty500 => "500",
        }
    }
}

/// A registered operation.
#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: String,
    pub verb: Verb,
    pub path: String,
    pub path_params: Vec<String>,
    pub meta: HandlerMeta,
    pub guards: Vec<GuardSpec>,
    pub request: Option<TypeId>,
    /// `None` means the handler never declared a response shape. Tolerated
    /// at registration, rejected when the OpenAPI document is built.
    pub response: Option<ResponseShape>,
}

impl Route {
    /// Parse a `"VERB /path"` pattern into a documented route. Returns `None`
    /// (with a warning) when the pattern has no verb prefix or a relative
    /// path, mirroring plain passthrough handlers that carry no metadata.
    pub fn parse(
        pattern: &str,
        meta: HandlerMeta,
        guards: Vec<GuardSpec>,
        request: Option<TypeId>,
        response: Option<ResponseShape>,
    ) -> Option<Self> {
        let Some((verb, path)) = parse_method_pattern(pattern) else {
            warn!(pattern, "pattern missing HTTP method prefix; skipping docs/client registration");
            return None;
        };
        let guards = guards
            .into_iter()
            .filter(|guard| !guard.name.is_empty())
            .collect();
        Some(Self {
            pattern: pattern.to_string(),
            verb,
            path_params: parse_path_params(&path),
            meta: infer_meta(meta, verb, &path),
            guards,
            request,
            response,
            path,
        })
    }
}

fn parse_method_pattern(pattern: &str) -> Option<(Verb, String)> {
    let mut parts = pattern.split_whitespace();
    let verb = Verb::parse(parts.next()?)?;
    let path = parts.next()?;
    if !path.starts_with('/') {
        return None;
    }
    Some((verb, path.to_string()))
}

#[allow(clippy::expect_used)]
static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^/}]+)\}").expect("valid path param pattern"));

/// Extract `{param}` placeholder names in path order.
pub(crate) fn parse_path_params(path: &str) -> Vec<String> {
    PATH_PARAM
        .captures_iter(path)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn infer_meta(mut meta: HandlerMeta, verb: Verb, path: &str) -> HandlerMeta {
    if !meta.service.is_empty() && !meta.method.is_empty() {
        return meta;
    }
    if meta.service.is_empty() {
        meta.service = "API".to_string();
    }
    if meta.method.is_empty() {
        meta.method = infer_method_name(verb, path);
    }
    meta
}

/// Derive a method name from the verb and path:
/// `GET /users/{user-id}` becomes `getUsersUserId`.
fn infer_method_name(verb: Verb, path: &str) -> String {
    let mut names = vec![verb.as_str().to_lowercase()];
    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        let segment = segment.trim_matches(['{', '}']).replace('-', "_");
        names.push(segment);
    }
    camelize_down(&names.join("_"))
}
