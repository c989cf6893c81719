//! OpenAPI 3.0 document assembly.
//!
//! [`build_document`] folds every documented route into a path/operation
//! tree, drives the schema generator for request and response payloads, and
//! serializes the whole document in memory. All maps are `BTreeMap`s, so two
//! passes over the same routes produce byte-identical JSON.

pub mod schema;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::descriptor::TypeGraph;
use crate::error::GenerateError;
use crate::overrides::TypeOverride;
use crate::query::query_params_for;
use crate::registry::preferred_schema_name;
use crate::route::Route;
use crate::util::{default_string, title_tag};
use self::schema::{OpenApiSchema, SchemaGen};

/// Top-level document metadata supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct OpenApiOptions {
    pub title: String,
    pub version: String,
    pub description: String,
    pub servers: Vec<OpenApiServer>,
    pub tags: Vec<OpenApiTag>,
    pub contact: Option<OpenApiContact>,
    pub license: Option<OpenApiLicense>,
    pub external_docs: Option<OpenApiExternalDocs>,
}

/// A server entry in the document.
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiServer {
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A top-level tag entry.
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiTag {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// API contact info.
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiContact {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
}

/// API license info.
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiLicense {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

/// Link to external documentation.
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiExternalDocs {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
struct Document {
    openapi: &'static str,
    info: Info,
    paths: BTreeMap<String, BTreeMap<String, Operation>>,
    components: Components,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<OpenApiTag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    servers: Vec<OpenApiServer>,
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    external_docs: Option<OpenApiExternalDocs>,
}

#[derive(Debug, Serialize)]
struct Info {
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    contact: Option<OpenApiContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<OpenApiLicense>,
}

#[derive(Debug, Serialize)]
struct Components {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    schemas: BTreeMap<String, OpenApiSchema>,
    #[serde(
        rename = "securitySchemes",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    security_schemes: BTreeMap<String, SecurityScheme>,
}

#[derive(Debug, Serialize)]
struct SecurityScheme {
    #[serde(rename = "type")]
    ty: &'static str,
    #[serde(rename = "in", skip_serializing_if = "String::is_empty")]
    location: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(
        rename = "x-authguard-prefix",
        skip_serializing_if = "String::is_empty"
    )]
    prefix: String,
}

#[derive(Debug, Default, Serialize)]
struct Operation {
    #[serde(skip_serializing_if = "String::is_empty")]
    summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    request_body: Option<RequestBody>,
    responses: BTreeMap<String, Response>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    security: Vec<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Serialize)]
struct Parameter {
    name: String,
    #[serde(rename = "in")]
    location: &'static str,
    required: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    schema: OpenApiSchema,
}

#[derive(Debug, Serialize)]
struct RequestBody {
    required: bool,
    content: BTreeMap<String, Media>,
}

#[derive(Debug, Serialize)]
struct Response {
    description: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    content: BTreeMap<String, Media>,
}

#[derive(Debug, Serialize)]
struct Media {
    schema: OpenApiSchema,
}

fn status_text(status: &str) -> &'static str {
    match status {
        "204" => "No Content",
        "500" => "Internal Server Error",
        _ => "OK",
    }
}

fn json_content(schema: OpenApiSchema) -> BTreeMap<String, Media> {
    BTreeMap::from([("application/json".to_string(), Media { schema })])
}

fn string_schema() -> OpenApiSchema {
    OpenApiSchema {
        ty: "string".to_string(),
        ..OpenApiSchema::default()
    }
}

/// Build the pretty-printed OpenAPI 3.0 document for the given routes.
pub fn build_document(
    graph: &TypeGraph,
    routes: &[Route],
    overrides: &BTreeMap<String, TypeOverride>,
    options: &OpenApiOptions,
) -> Result<Vec<u8>, GenerateError> {
    let mut generator = SchemaGen::new(graph, overrides);
    let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();
    let mut security_schemes = BTreeMap::new();

    for route in routes {
        let mut op = Operation {
            summary: route.meta.summary.clone(),
            description: route.meta.description.clone(),
            tags: route.meta.tags.clone(),
            ..Operation::default()
        };

        for guard in &route.guards {
            security_schemes.insert(
                guard.name.clone(),
                SecurityScheme {
                    ty: "apiKey",
                    location: guard.location.clone(),
                    name: guard.param.clone(),
                    prefix: guard.prefix.clone(),
                },
            );
            op.security
                .push(BTreeMap::from([(guard.name.clone(), Vec::new())]));
        }

        for param in &route.path_params {
            op.parameters.push(Parameter {
                name: param.clone(),
                location: "path",
                required: true,
                description: String::new(),
                schema: string_schema(),
            });
        }

        if let Some(request) = route.request {
            if let Some(preferred) = preferred_schema_name(&route.meta.service, graph, request) {
                generator.prefer_name(request, &preferred);
            }
            let query_info = query_params_for(graph, request)?;
            for param in &query_info.params {
                let schema = if param.is_array {
                    OpenApiSchema {
                        ty: "array".to_string(),
                        items: Some(Box::new(string_schema())),
                        ..OpenApiSchema::default()
                    }
                } else {
                    string_schema()
                };
                op.parameters.push(Parameter {
                    name: param.name.clone(),
                    location: "query",
                    required: !param.optional,
                    description: param.doc.clone(),
                    schema,
                });
            }
            if query_info.has_body() {
                let schema = generator.schema_for(request)?;
                op.request_body = Some(RequestBody {
                    required: true,
                    content: json_content(schema),
                });
            }
        }

        let Some(response) = route.response else {
            return Err(GenerateError::MissingResponseType {
                pattern: route.pattern.clone(),
            });
        };
        let status = response.status();
        let response_schema = match response.type_id() {
            Some(id) => {
                if let Some(preferred) = preferred_schema_name(&route.meta.service, graph, id) {
                    generator.prefer_name(id, &preferred);
                }
                Some(generator.schema_for(id)?)
            }
            None => None,
        };
        let rendered = match response_schema {
            Some(schema) if status != "204" => Response {
                description: status_text(status),
                content: json_content(schema),
            },
            _ => Response {
                description: status_text(status),
                content: BTreeMap::new(),
            },
        };
        op.responses.insert(status.to_string(), rendered);

        paths
            .entry(route.path.clone())
            .or_default()
            .insert(route.verb.as_str().to_lowercase(), op);
    }

    let doc = Document {
        openapi: "3.0.3",
        info: Info {
            title: default_string(&options.title, "API"),
            description: options.description.clone(),
            version: default_string(&options.version, "0.0.1"),
            contact: options.contact.clone(),
            license: options.license.clone(),
        },
        paths,
        components: Components {
            schemas: generator.into_components(),
            security_schemes,
        },
        tags: document_tags(&options.tags),
        servers: document_servers(&options.servers),
        external_docs: options.external_docs.clone(),
    };

    let mut bytes = serde_json::to_vec_pretty(&doc)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn document_tags(tags: &[OpenApiTag]) -> Vec<OpenApiTag> {
    tags.iter()
        .filter(|tag| !tag.name.is_empty())
        .map(|tag| OpenApiTag {
            name: title_tag(&tag.name),
            description: tag.description.clone(),
        })
        .collect()
}

fn document_servers(servers: &[OpenApiServer]) -> Vec<OpenApiServer> {
    servers
        .iter()
        .filter(|server| !server.url.is_empty())
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldShape, Scalar};
    use crate::route::{GuardSpec, HandlerMeta, ResponseShape, Route};
    use serde_json::Value;

    fn doc_value(
        graph: &TypeGraph,
        routes: &[Route],
        options: &OpenApiOptions,
    ) -> Value {
        let bytes = build_document(graph, routes, &BTreeMap::new(), options).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn document_envelope_and_defaults() {
        let graph = TypeGraph::new();
        let route = Route::parse(
            "GET /health",
            HandlerMeta::default(),
            Vec::new(),
            None,
            Some(ResponseShape::Empty200),
        )
        .unwrap();

        let doc = doc_value(&graph, &[route], &OpenApiOptions::default());
        assert_eq!(doc["openapi"], "3.0.3");
        assert_eq!(doc["info"]["title"], "API");
        assert_eq!(doc["info"]["version"], "0.0.1");
        let response = &doc["paths"]["/health"]["get"]["responses"]["200"];
        assert_eq!(response["description"], "OK");
        assert!(response.get("content").is_none());
    }

    #[test]
    fn missing_response_is_an_error() {
        let graph = TypeGraph::new();
        let route = Route::parse(
            "GET /broken",
            HandlerMeta::default(),
            Vec::new(),
            None,
            None,
        )
        .unwrap();

        let err =
            build_document(&graph, &[route], &BTreeMap::new(), &OpenApiOptions::default())
                .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::MissingResponseType { pattern } if pattern == "GET /broken"
        ));
    }

    #[test]
    fn body_and_response_schemas_are_referenced() {
        let mut graph = TypeGraph::new();
        let string = graph.scalar(Scalar::String);
        let req = graph.named_struct(
            "demo",
            "CreateUserRequest",
            vec![FieldShape::new("Name", string)],
        );
        let resp = graph.named_struct("demo", "User", vec![FieldShape::new("Name", string)]);
        let route = Route::parse(
            "POST /users",
            HandlerMeta::default(),
            Vec::new(),
            Some(req),
            Some(ResponseShape::Object(resp)),
        )
        .unwrap();

        let doc = doc_value(&graph, &[route], &OpenApiOptions::default());
        let op = &doc["paths"]["/users"]["post"];
        assert_eq!(
            op["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/CreateUserRequest"
        );
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/User"
        );
        assert!(doc["components"]["schemas"]["User"].is_object());
    }

    #[test]
    fn query_only_request_emits_no_body() {
        let mut graph = TypeGraph::new();
        let string = graph.scalar(Scalar::String);
        let req = graph.named_struct(
            "demo",
            "SearchRequest",
            vec![FieldShape::new("Q", string).query("", false)],
        );
        let route = Route::parse(
            "GET /search",
            HandlerMeta::default(),
            Vec::new(),
            Some(req),
            Some(ResponseShape::Empty200),
        )
        .unwrap();

        let doc = doc_value(&graph, &[route], &OpenApiOptions::default());
        let op = &doc["paths"]["/search"]["get"];
        assert!(op.get("requestBody").is_none());
        let params = op["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["name"], "q");
        assert_eq!(params[0]["in"], "query");
        assert_eq!(params[0]["required"], true);
        // Query-only request types never become components.
        assert!(doc["components"].get("schemas").is_none());
    }

    #[test]
    fn mixed_request_documents_query_and_body() {
        let mut graph = TypeGraph::new();
        let string = graph.scalar(Scalar::String);
        let int = graph.scalar(Scalar::Int64);
        let req = graph.named_struct(
            "demo",
            "ListRequest",
            vec![
                FieldShape::new("Page", int).query("", true),
                FieldShape::new("Filter", string),
            ],
        );
        let route = Route::parse(
            "POST /items",
            HandlerMeta::default(),
            Vec::new(),
            Some(req),
            Some(ResponseShape::Empty200),
        )
        .unwrap();

        let doc = doc_value(&graph, &[route], &OpenApiOptions::default());
        let op = &doc["paths"]["/items"]["post"];
        let params = op["parameters"].as_array().unwrap();
        assert_eq!(params[0]["name"], "page");
        assert_eq!(params[0]["required"], false);
        assert!(op["requestBody"].is_object());
        // Query fields are still walked into the component schema.
        let props = &doc["components"]["schemas"]["ListRequest"]["properties"];
        assert!(props.get("filter").is_some());
    }

    #[test]
    fn guards_become_security_schemes() {
        let graph = TypeGraph::new();
        let guard = GuardSpec {
            name: "AdminKey".to_string(),
            location: "header".to_string(),
            param: "X-Admin-Key".to_string(),
            prefix: "Bearer ".to_string(),
        };
        let route = Route::parse(
            "DELETE /admin/cache",
            HandlerMeta::default(),
            vec![guard],
            None,
            Some(ResponseShape::Empty204),
        )
        .unwrap();

        let doc = doc_value(&graph, &[route], &OpenApiOptions::default());
        let scheme = &doc["components"]["securitySchemes"]["AdminKey"];
        assert_eq!(scheme["type"], "apiKey");
        assert_eq!(scheme["in"], "header");
        assert_eq!(scheme["name"], "X-Admin-Key");
        assert_eq!(scheme["x-authguard-prefix"], "Bearer ");
        let security = doc["paths"]["/admin/cache"]["delete"]["security"]
            .as_array()
            .unwrap();
        assert!(security[0]["AdminKey"].as_array().unwrap().is_empty());
        let response = &doc["paths"]["/admin/cache"]["delete"]["responses"]["204"];
        assert_eq!(response["description"], "No Content");
    }

    #[test]
    fn path_params_are_required_strings() {
        let graph = TypeGraph::new();
        let route = Route::parse(
            "GET /users/{id}",
            HandlerMeta::default(),
            Vec::new(),
            None,
            Some(ResponseShape::Empty200),
        )
        .unwrap();

        let doc = doc_value(&graph, &[route], &OpenApiOptions::default());
        let params = doc["paths"]["/users/{id}"]["get"]["parameters"]
            .as_array()
            .unwrap();
        assert_eq!(params[0]["name"], "id");
        assert_eq!(params[0]["in"], "path");
        assert_eq!(params[0]["required"], true);
        assert_eq!(params[0]["schema"]["type"], "string");
    }

    #[test]
    fn options_flow_into_the_envelope() {
        let graph = TypeGraph::new();
        let route = Route::parse(
            "GET /health",
            HandlerMeta::default(),
            Vec::new(),
            None,
            Some(ResponseShape::Empty200),
        )
        .unwrap();
        let options = OpenApiOptions {
            title: "Billing API".to_string(),
            version: "2.1.0".to_string(),
            description: "Billing operations".to_string(),
            servers: vec![
                OpenApiServer {
                    url: "https://api.example.com".to_string(),
                    description: String::new(),
                },
                OpenApiServer {
                    url: String::new(),
                    description: "dropped".to_string(),
                },
            ],
            tags: vec![OpenApiTag {
                name: "billing".to_string(),
                description: "Invoices".to_string(),
            }],
            ..OpenApiOptions::default()
        };

        let doc = doc_value(&graph, &[route], &options);
        assert_eq!(doc["info"]["title"], "Billing API");
        assert_eq!(doc["info"]["version"], "2.1.0");
        assert_eq!(doc["servers"].as_array().unwrap().len(), 1);
        assert_eq!(doc["tags"][0]["name"], "Billing");
    }

    #[test]
    fn identical_passes_produce_identical_bytes() {
        let mut graph = TypeGraph::new();
        let string = graph.scalar(Scalar::String);
        let resp = graph.named_struct("demo", "User", vec![FieldShape::new("Name", string)]);
        let routes = vec![
            Route::parse(
                "GET /users/{id}",
                HandlerMeta::default(),
                Vec::new(),
                None,
                Some(ResponseShape::Object(resp)),
            )
            .unwrap(),
            Route::parse(
                "DELETE /users/{id}",
                HandlerMeta::default(),
                Vec::new(),
                None,
                Some(ResponseShape::Empty204),
            )
            .unwrap(),
        ];

        let first =
            build_document(&graph, &routes, &BTreeMap::new(), &OpenApiOptions::default()).unwrap();
        let second =
            build_document(&graph, &routes, &BTreeMap::new(), &OpenApiOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
