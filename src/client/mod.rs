//! Client specification: the language-neutral model the templates render.
//!
//! One registry walk produces the services, methods, and objects for a
//! single target language. Services and methods are sorted, so the rendered
//! source is diff-stable across passes.

pub mod render;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::descriptor::TypeGraph;
use crate::error::GenerateError;
use crate::overrides::TypeOverride;
use crate::query::{QueryParam, query_params_for};
use crate::registry::{Lang, Object, Registry, preferred_schema_name};
use crate::route::{GuardSpec, Route};
use crate::util::camelize_down;

/// Everything a client template needs.
#[derive(Debug, Serialize)]
pub struct ClientSpec {
    pub services: Vec<ClientService>,
    pub objects: Vec<Object>,
}

/// One service grouping of client methods.
#[derive(Debug, Serialize)]
pub struct ClientService {
    pub name: String,
    pub methods: Vec<ClientMethod>,
}

/// One callable client method.
#[derive(Debug, Serialize)]
pub struct ClientMethod {
    pub name: String,
    pub summary: String,
    pub http_method: String,
    pub path: String,
    pub path_params: Vec<String>,
    pub has_body: bool,
    pub has_query: bool,
    pub query_params: Vec<QueryParam>,
    pub has_auth: bool,
    pub auth: GuardSpec,
    pub auth_param: String,
    pub request_type: String,
    pub response_type: String,
}

/// Build the client model for one target language.
pub fn build_client_spec(
    graph: &TypeGraph,
    routes: &[Route],
    overrides: &BTreeMap<String, TypeOverride>,
    lang: Lang,
) -> Result<ClientSpec, GenerateError> {
    let mut registry = Registry::new(graph, overrides);
    let mut services: BTreeMap<String, Vec<ClientMethod>> = BTreeMap::new();

    for route in routes {
        let service = route.meta.service.clone();
        let method_name = camelize_down(&route.meta.method);
        if service.is_empty() || method_name.is_empty() {
            continue;
        }

        let mut has_body = false;
        let mut has_query = false;
        let mut query_params = Vec::new();
        let mut request_type = String::new();
        if let Some(request) = route.request {
            if let Some(preferred) = preferred_schema_name(&service, graph, request) {
                registry.prefer_name(request, &preferred);
            }
            let info = query_params_for(graph, request)?;
            has_query = !info.params.is_empty();
            has_body = info.has_body();
            query_params = info.params;
            if has_body {
                registry.add_type(request)?;
                request_type = registry.render_type(lang, request)?;
            }
        }

        let mut response_type = String::new();
        if let Some(id) = route.response.and_then(|response| response.type_id()) {
            if let Some(preferred) = preferred_schema_name(&service, graph, id) {
                registry.prefer_name(id, &preferred);
            }
            registry.add_type(id)?;
            response_type = registry.render_type(lang, id)?;
        }

        let mut method = ClientMethod {
            name: method_name,
            summary: route.meta.summary.clone(),
            http_method: route.verb.as_str().to_string(),
            path: route.path.clone(),
            path_params: route.path_params.clone(),
            has_body,
            has_query,
            query_params,
            has_auth: false,
            auth: GuardSpec::default(),
            auth_param: String::new(),
            request_type,
            response_type,
        };
        if let Some(guard) = route.guards.first() {
            method.has_auth = true;
            method.auth = guard.clone();
            method.auth_param = auth_param_name(&guard.name);
        }
        services.entry(service).or_default().push(method);
    }

    let services = services
        .into_iter()
        .map(|(name, mut methods)| {
            methods.sort_by(|a, b| a.name.cmp(&b.name));
            ClientService { name, methods }
        })
        .collect();

    Ok(ClientSpec {
        services,
        objects: registry.objects_with(lang)?,
    })
}

fn auth_param_name(name: &str) -> String {
    if name.is_empty() {
        return "auth".to_string();
    }
    let candidate = camelize_down(name);
    if candidate.is_empty() {
        "auth".to_string()
    } else {
        candidate
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldShape, Scalar, TypeId};
    use crate::route::{HandlerMeta, ResponseShape};

    fn meta(service: &str, method: &str) -> HandlerMeta {
        HandlerMeta {
            service: service.to_string(),
            method: method.to_string(),
            ..HandlerMeta::default()
        }
    }

    fn lookup_fixture() -> (TypeGraph, TypeId, TypeId) {
        let mut graph = TypeGraph::new();
        let string = graph.scalar(Scalar::String);
        let req = graph.named_struct(
            "demo",
            "GetByCodeRequest",
            vec![FieldShape::new("Code", string)],
        );
        let resp = graph.named_struct("demo", "State", vec![FieldShape::new("Name", string)]);
        (graph, req, resp)
    }

    #[test]
    fn services_and_methods_are_sorted() {
        let (graph, req, resp) = lookup_fixture();
        let routes = vec![
            Route::parse(
                "GET /b",
                meta("Zoo", "list"),
                Vec::new(),
                None,
                Some(ResponseShape::Object(resp)),
            )
            .unwrap(),
            Route::parse(
                "GET /a",
                meta("Alpha", "get"),
                Vec::new(),
                Some(req),
                Some(ResponseShape::Object(resp)),
            )
            .unwrap(),
            Route::parse(
                "GET /c",
                meta("Alpha", "count"),
                Vec::new(),
                None,
                Some(ResponseShape::Object(resp)),
            )
            .unwrap(),
        ];

        let spec = build_client_spec(&graph, &routes, &BTreeMap::new(), Lang::Js).unwrap();
        let service_names: Vec<_> = spec.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(service_names, ["Alpha", "Zoo"]);
        let method_names: Vec<_> = spec.services[0]
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(method_names, ["count", "get"]);
    }

    #[test]
    fn method_names_are_camelized() {
        let (graph, _, resp) = lookup_fixture();
        let routes = vec![
            Route::parse(
                "GET /states/{code}",
                meta("States", "GetByCode"),
                Vec::new(),
                None,
                Some(ResponseShape::Object(resp)),
            )
            .unwrap(),
        ];

        let spec = build_client_spec(&graph, &routes, &BTreeMap::new(), Lang::Js).unwrap();
        assert_eq!(spec.services[0].methods[0].name, "getByCode");
        assert_eq!(spec.services[0].methods[0].path_params, ["code"]);
    }

    #[test]
    fn query_only_requests_drop_the_body() {
        let mut graph = TypeGraph::new();
        let string = graph.scalar(Scalar::String);
        let req = graph.named_struct(
            "demo",
            "SearchRequest",
            vec![FieldShape::new("Q", string).query("", false)],
        );
        let routes = vec![
            Route::parse(
                "GET /search",
                meta("Search", "run"),
                Vec::new(),
                Some(req),
                Some(ResponseShape::Empty200),
            )
            .unwrap(),
        ];

        let spec = build_client_spec(&graph, &routes, &BTreeMap::new(), Lang::Js).unwrap();
        let method = &spec.services[0].methods[0];
        assert!(!method.has_body);
        assert!(method.has_query);
        assert_eq!(method.query_params[0].name, "q");
        assert!(method.request_type.is_empty());
        assert!(method.response_type.is_empty());
        assert!(spec.objects.is_empty());
    }

    #[test]
    fn mixed_requests_keep_query_and_body() {
        let mut graph = TypeGraph::new();
        let string = graph.scalar(Scalar::String);
        let req = graph.named_struct(
            "demo",
            "ListRequest",
            vec![
                FieldShape::new("Page", string).query("", true),
                FieldShape::new("Filter", string),
            ],
        );
        let routes = vec![
            Route::parse(
                "POST /items",
                meta("Items", "list"),
                Vec::new(),
                Some(req),
                Some(ResponseShape::Empty200),
            )
            .unwrap(),
        ];

        let spec = build_client_spec(&graph, &routes, &BTreeMap::new(), Lang::Js).unwrap();
        let method = &spec.services[0].methods[0];
        assert!(method.has_query);
        assert!(method.has_body);
        assert_eq!(method.query_params[0].name, "page");
        assert_eq!(method.request_type, "ItemsListRequest");
    }

    #[test]
    fn first_guard_becomes_auth() {
        let (graph, _, resp) = lookup_fixture();
        let guard = GuardSpec {
            name: "admin-key".to_string(),
            location: "header".to_string(),
            param: "X-Admin-Key".to_string(),
            prefix: String::new(),
        };
        let routes = vec![
            Route::parse(
                "GET /admin",
                meta("Admin", "get"),
                vec![guard],
                None,
                Some(ResponseShape::Object(resp)),
            )
            .unwrap(),
        ];

        let spec = build_client_spec(&graph, &routes, &BTreeMap::new(), Lang::Js).unwrap();
        let method = &spec.services[0].methods[0];
        assert!(method.has_auth);
        assert_eq!(method.auth.param, "X-Admin-Key");
        assert_eq!(method.auth_param, "adminKey");
    }

    #[test]
    fn service_prefix_scopes_type_names() {
        let (graph, req, resp) = lookup_fixture();
        let routes = vec![
            Route::parse(
                "GET /states/{code}",
                meta("Lookup", "getByCode"),
                Vec::new(),
                Some(req),
                Some(ResponseShape::Object(resp)),
            )
            .unwrap(),
        ];

        let spec = build_client_spec(&graph, &routes, &BTreeMap::new(), Lang::Js).unwrap();
        let method = &spec.services[0].methods[0];
        assert_eq!(method.request_type, "LookupGetByCodeRequest");
        assert_eq!(method.response_type, "LookupState");
        let names: Vec<_> = spec.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["LookupGetByCodeRequest", "LookupState"]);
    }

    #[test]
    fn js_and_py_share_object_names() {
        let (graph, req, resp) = lookup_fixture();
        let routes = vec![
            Route::parse(
                "GET /states/{code}",
                meta("States", "getByCode"),
                Vec::new(),
                Some(req),
                Some(ResponseShape::Object(resp)),
            )
            .unwrap(),
        ];

        let js = build_client_spec(&graph, &routes, &BTreeMap::new(), Lang::Js).unwrap();
        let py = build_client_spec(&graph, &routes, &BTreeMap::new(), Lang::Py).unwrap();
        let js_names: Vec<_> = js.objects.iter().map(|o| o.name.clone()).collect();
        let py_names: Vec<_> = py.objects.iter().map(|o| o.name.clone()).collect();
        assert_eq!(js_names, py_names);
    }

    #[test]
    fn auth_param_defaults() {
        assert_eq!(auth_param_name(""), "auth");
        assert_eq!(auth_param_name("ApiKey"), "apiKey");
        assert_eq!(auth_param_name("admin-key"), "adminKey");
    }
}
