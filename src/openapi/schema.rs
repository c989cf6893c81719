//! JSON Schema generation for OpenAPI components.
//!
//! Named structs become `$ref`s into `#/components/schemas`; containers and
//! scalars render inline. The generator keeps a seen-map keyed by type id and
//! registers each component before expanding its fields, so cyclic DTO
//! graphs terminate with a back-reference instead of recursing forever.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::descriptor::{MapKey, Scalar, TypeGraph, TypeId, TypeKind};
use crate::error::GenerateError;
use crate::overrides::{TypeOverride, merge_type_overrides, override_for};
use crate::util::default_string;

/// A JSON schema node as it appears in an OpenAPI document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OpenApiSchema {
    #[serde(rename = "$ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub ty: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub format: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, OpenApiSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<OpenApiSchema>>,
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<OpenApiSchema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<OpenApiSchema>,
}

impl OpenApiSchema {
    fn component_ref(name: &str) -> Self {
        Self {
            reference: format!("#/components/schemas/{name}"),
            ..Self::default()
        }
    }

    fn typed(ty: &str) -> Self {
        Self {
            ty: ty.to_string(),
            ..Self::default()
        }
    }

    fn typed_format(ty: &str, format: &str) -> Self {
        Self {
            ty: ty.to_string(),
            format: format.to_string(),
            ..Self::default()
        }
    }

    fn raw_ref(reference: &str) -> Self {
        Self {
            reference: reference.to_string(),
            ..Self::default()
        }
    }
}

/// Builds component schemas for one document.
pub struct SchemaGen<'g> {
    graph: &'g TypeGraph,
    overrides: BTreeMap<String, TypeOverride>,
    components: BTreeMap<String, OpenApiSchema>,
    seen: HashMap<TypeId, String>,
    seen_names: HashMap<String, TypeId>,
    preferred: HashMap<TypeId, String>,
}

impl<'g> SchemaGen<'g> {
    pub fn new(graph: &'g TypeGraph, user_overrides: &BTreeMap<String, TypeOverride>) -> Self {
        Self {
            graph,
            overrides: merge_type_overrides(user_overrides),
            components: BTreeMap::new(),
            seen: HashMap::new(),
            seen_names: HashMap::new(),
            preferred: HashMap::new(),
        }
    }

    /// Consume the generator, yielding the component schema map.
    pub fn into_components(self) -> BTreeMap<String, OpenApiSchema> {
        self.components
    }

    /// Hint a component name for a type. Empty hints are ignored.
    pub fn prefer_name(&mut self, id: TypeId, name: &str) {
        let (base, _) = self.graph.deref(id);
        if name.is_empty() {
            return;
        }
        self.preferred.insert(base, name.to_string());
    }

    /// Build the schema for a type, registering components as a side effect.
    pub fn schema_for(&mut self, id: TypeId) -> Result<OpenApiSchema, GenerateError> {
        let graph = self.graph;
        let (base, nullable) = graph.deref(id);

        if let Some(name) = self.seen.get(&base) {
            let mut schema = OpenApiSchema::component_ref(name);
            schema.nullable = nullable;
            return Ok(schema);
        }
        if let Some(mut schema) = self.override_schema(base) {
            schema.nullable = nullable;
            return Ok(schema);
        }
        if let TypeKind::Struct(shape) = graph.kind(base)
            && !shape.name.is_empty()
        {
            let name = self.schema_name_for(base)?;
            // Register before the field walk so cycles resolve to a $ref.
            self.seen.insert(base, name.clone());
            self.components.insert(name.clone(), OpenApiSchema::default());
            let schema = self.struct_schema(base)?;
            self.components.insert(name.clone(), schema);
            let mut reference = OpenApiSchema::component_ref(&name);
            reference.nullable = nullable;
            return Ok(reference);
        }

        let mut schema = self.inline_schema(base)?;
        schema.nullable = nullable;
        Ok(schema)
    }

    fn override_schema(&self, id: TypeId) -> Option<OpenApiSchema> {
        let entry = override_for(&self.overrides, self.graph, id)?;
        if entry.openapi_type.is_none() && entry.openapi_format.is_none() {
            return None;
        }
        let ty = entry
            .openapi_type
            .clone()
            .unwrap_or_else(|| "string".to_string());
        Some(OpenApiSchema {
            ty,
            format: entry.openapi_format.clone().unwrap_or_default(),
            ..OpenApiSchema::default()
        })
    }

    fn struct_schema(&mut self, id: TypeId) -> Result<OpenApiSchema, GenerateError> {
        let Some(shape) = self.graph.struct_shape(id) else {
            return Ok(OpenApiSchema::typed("object"));
        };
        let fields = shape.fields.clone();
        let mut properties = BTreeMap::new();
        let mut required = Vec::new();
        for field in &fields {
            let Some(name) = field.resolved_wire_name() else {
                continue;
            };
            let mut schema = self.schema_for(field.ty)?;
            let nullable = schema.nullable;
            if !field.doc.is_empty() {
                if !schema.reference.is_empty() {
                    // A sibling description would be dropped next to $ref.
                    schema = OpenApiSchema {
                        all_of: vec![OpenApiSchema::raw_ref(&schema.reference)],
                        description: field.doc.clone(),
                        nullable,
                        ..OpenApiSchema::default()
                    };
                } else {
                    schema.description = field.doc.clone();
                }
            }
            if !field.omittable && !self.graph.is_pointer(field.ty) {
                required.push(name.clone());
            }
            properties.insert(name, schema);
        }
        required.sort();
        Ok(OpenApiSchema {
            ty: "object".to_string(),
            properties,
            required,
            ..OpenApiSchema::default()
        })
    }

    fn inline_schema(&mut self, id: TypeId) -> Result<OpenApiSchema, GenerateError> {
        let (base, _) = self.graph.deref(id);
        if let Some(schema) = self.override_schema(base) {
            return Ok(schema);
        }
        let schema = match self.graph.kind(base) {
            TypeKind::Scalar(Scalar::String) => OpenApiSchema::typed("string"),
            TypeKind::Scalar(Scalar::Bool) => OpenApiSchema::typed("boolean"),
            TypeKind::Scalar(Scalar::Int32) => OpenApiSchema::typed_format("integer", "int32"),
            TypeKind::Scalar(Scalar::Int64) => OpenApiSchema::typed_format("integer", "int64"),
            TypeKind::Scalar(Scalar::Uint64) => OpenApiSchema::typed("integer"),
            TypeKind::Scalar(Scalar::Float32) => OpenApiSchema::typed_format("number", "float"),
            TypeKind::Scalar(Scalar::Float64) => OpenApiSchema::typed_format("number", "double"),
            TypeKind::Scalar(Scalar::Any) => OpenApiSchema::typed("string"),
            TypeKind::List(elem) => OpenApiSchema {
                ty: "array".to_string(),
                items: Some(Box::new(self.schema_for(*elem)?)),
                ..OpenApiSchema::default()
            },
            TypeKind::Map { key, value } => match key {
                MapKey::Other => OpenApiSchema::typed("object"),
                MapKey::String => OpenApiSchema {
                    ty: "object".to_string(),
                    additional_properties: Some(Box::new(self.schema_for(*value)?)),
                    ..OpenApiSchema::default()
                },
            },
            TypeKind::Struct(_) => self.struct_schema(base)?,
            TypeKind::Pointer(_) => OpenApiSchema::typed("string"),
        };
        Ok(schema)
    }

    fn schema_name_for(&mut self, id: TypeId) -> Result<String, GenerateError> {
        let name = match self.preferred.get(&id) {
            Some(preferred) => preferred.clone(),
            None => default_string(
                self.graph.struct_name(id).unwrap_or_default(),
                &self.graph.synthesized_name(id),
            ),
        };
        if let Some(other) = self.seen_names.get(&name)
            && *other != id
        {
            return Err(GenerateError::NameCollision { name });
        }
        self.seen_names.insert(name.clone(), id);
        Ok(name)
    }
}
