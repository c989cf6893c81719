//! Type registry: walks DTO type graphs once and renders them per language.
//!
//! The registry is pass-scoped mutable state: one canonical object per named
//! structured type, one canonical name per type, with collisions surfaced as
//! hard failures. A single walk serves every renderer; [`Registry::objects_with`]
//! re-renders the already-walked objects for each target language without
//! touching the type graph again.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::Serialize;

use crate::descriptor::{MapKey, Scalar, TypeGraph, TypeId, TypeKind};
use crate::error::GenerateError;
use crate::overrides::{TypeOverride, is_override_scalar, merge_type_overrides, override_for};

/// Target language for type rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Js,
    Py,
}

/// A named schema object rendered for one target language.
#[derive(Debug, Clone, Serialize)]
pub struct Object {
    pub name: String,
    pub fields: Vec<Field>,
}

/// A rendered object field.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub optional: bool,
    pub nullable: bool,
    pub doc: String,
}

#[derive(Debug, Clone)]
struct ObjectDef {
    name: String,
    fields: Vec<FieldDef>,
}

#[derive(Debug, Clone)]
struct FieldDef {
    name: String,
    ty: TypeId,
    optional: bool,
    nullable: bool,
    doc: String,
}

/// Walks type graphs and allocates canonical schema names.
#[derive(Debug)]
pub struct Registry<'g> {
    graph: &'g TypeGraph,
    overrides: BTreeMap<String, TypeOverride>,
    objects: IndexMap<TypeId, ObjectDef>,
    name_by_type: HashMap<TypeId, String>,
    type_by_name: HashMap<String, TypeId>,
    preferred: HashMap<TypeId, String>,
}

impl<'g> Registry<'g> {
    pub fn new(graph: &'g TypeGraph, user_overrides: &BTreeMap<String, TypeOverride>) -> Self {
        Self {
            graph,
            overrides: merge_type_overrides(user_overrides),
            objects: IndexMap::new(),
            name_by_type: HashMap::new(),
            type_by_name: HashMap::new(),
            preferred: HashMap::new(),
        }
    }

    /// Hint a canonical name for a type. Effective only before the type is
    /// first resolved; empty hints are ignored.
    pub fn prefer_name(&mut self, id: TypeId, name: &str) {
        let (base, _) = self.graph.deref(id);
        if name.is_empty() {
            return;
        }
        self.preferred.insert(base, name.to_string());
    }

    /// Register a type for schema generation. Idempotent: a type already
    /// bound to an object is a no-op. Recurses into fields and one level of
    /// container element; override scalars terminate immediately.
    pub fn add_type(&mut self, id: TypeId) -> Result<(), GenerateError> {
        let graph = self.graph;
        let (base, _) = graph.deref(id);
        if is_override_scalar(&self.overrides, graph, base) {
            return Ok(());
        }
        match graph.kind(base) {
            TypeKind::Struct(shape) => {
                if shape.name.is_empty() {
                    return Ok(());
                }
                if self.objects.contains_key(&base) {
                    return Ok(());
                }
                let name = self.object_name(base)?;
                // Insert before walking fields so cyclic shapes terminate.
                self.objects.insert(
                    base,
                    ObjectDef {
                        name,
                        fields: Vec::new(),
                    },
                );
                let shapes = shape.fields.clone();
                let mut fields = Vec::with_capacity(shapes.len());
                for field in &shapes {
                    let Some(wire_name) = field.resolved_wire_name() else {
                        continue;
                    };
                    fields.push(FieldDef {
                        name: wire_name,
                        ty: field.ty,
                        optional: field.omittable,
                        nullable: graph.is_pointer(field.ty),
                        doc: field.doc.clone(),
                    });
                    self.add_type(field.ty)?;
                }
                if let Some(def) = self.objects.get_mut(&base) {
                    def.fields = fields;
                }
                Ok(())
            }
            TypeKind::List(elem) => self.add_type(*elem),
            TypeKind::Map { value, .. } => self.add_type(*value),
            TypeKind::Scalar(_) | TypeKind::Pointer(_) => Ok(()),
        }
    }

    /// Resolve the canonical name for a named struct, binding it on first use.
    fn object_name(&mut self, id: TypeId) -> Result<String, GenerateError> {
        if let Some(name) = self.name_by_type.get(&id) {
            return Ok(name.clone());
        }
        if let Some(preferred) = self.preferred.get(&id).cloned() {
            return self.bind_name(id, preferred);
        }
        let mut name = self
            .graph
            .struct_name(id)
            .map(str::to_string)
            .unwrap_or_default();
        if name.is_empty() {
            name = self.graph.synthesized_name(id);
        }
        self.bind_name(id, name)
    }

    fn bind_name(&mut self, id: TypeId, name: String) -> Result<String, GenerateError> {
        if let Some(other) = self.type_by_name.get(&name)
            && *other != id
        {
            return Err(GenerateError::NameCollision { name });
        }
        self.name_by_type.insert(id, name.clone());
        self.type_by_name.insert(name.clone(), id);
        Ok(name)
    }

    /// Render a type reference for the target language.
    pub fn render_type(&mut self, lang: Lang, id: TypeId) -> Result<String, GenerateError> {
        match lang {
            Lang::Js => self.js_type(id),
            Lang::Py => self.py_type(id),
        }
    }

    fn js_type(&mut self, id: TypeId) -> Result<String, GenerateError> {
        let graph = self.graph;
        let (base, _) = graph.deref(id);
        if let Some(entry) = override_for(&self.overrides, graph, base)
            && let Some(js) = &entry.js_type
        {
            return Ok(js.clone());
        }
        let rendered = match graph.kind(base) {
            TypeKind::Scalar(Scalar::Bool) => "boolean".to_string(),
            TypeKind::Scalar(Scalar::String) => "string".to_string(),
            TypeKind::Scalar(
                Scalar::Int32 | Scalar::Int64 | Scalar::Uint64 | Scalar::Float32 | Scalar::Float64,
            ) => "number".to_string(),
            TypeKind::List(elem) => {
                let elem_type = self.js_type(*elem)?;
                format!("{elem_type}[]")
            }
            TypeKind::Map { .. } => "object".to_string(),
            TypeKind::Struct(shape) => {
                if shape.name.is_empty() {
                    "object".to_string()
                } else {
                    self.object_name(base)?
                }
            }
            TypeKind::Scalar(Scalar::Any) | TypeKind::Pointer(_) => "any".to_string(),
        };
        Ok(rendered)
    }

    fn py_type(&mut self, id: TypeId) -> Result<String, GenerateError> {
        let graph = self.graph;
        let (base, _) = graph.deref(id);
        if let Some(entry) = override_for(&self.overrides, graph, base)
            && let Some(py) = &entry.py_type
        {
            return Ok(py.clone());
        }
        let rendered = match graph.kind(base) {
            TypeKind::Scalar(Scalar::Bool) => "bool".to_string(),
            TypeKind::Scalar(Scalar::String) => "str".to_string(),
            TypeKind::Scalar(Scalar::Int32 | Scalar::Int64 | Scalar::Uint64) => "int".to_string(),
            TypeKind::Scalar(Scalar::Float32 | Scalar::Float64) => "float".to_string(),
            TypeKind::List(elem) => {
                let elem_type = self.py_type(*elem)?;
                format!("list[{elem_type}]")
            }
            TypeKind::Map { key, value } => {
                let value_type = self.py_type(*value)?;
                match key {
                    MapKey::String => format!("dict[str, {value_type}]"),
                    MapKey::Other => format!("dict[Any, {value_type}]"),
                }
            }
            TypeKind::Struct(shape) => {
                if shape.name.is_empty() {
                    "dict[str, Any]".to_string()
                } else {
                    // Quoted forward reference.
                    format!("\"{}\"", self.object_name(base)?)
                }
            }
            TypeKind::Scalar(Scalar::Any) | TypeKind::Pointer(_) => "Any".to_string(),
        };
        Ok(rendered)
    }

    /// Render every walked object for the target language, sorted by name.
    pub fn objects_with(&mut self, lang: Lang) -> Result<Vec<Object>, GenerateError> {
        let defs: Vec<ObjectDef> = self.objects.values().cloned().collect();
        let mut objects = Vec::with_capacity(defs.len());
        for def in defs {
            let mut fields = Vec::with_capacity(def.fields.len());
            for field in &def.fields {
                fields.push(Field {
                    name: field.name.clone(),
                    ty: self.render_type(lang, field.ty)?,
                    optional: field.optional,
                    nullable: field.nullable,
                    doc: field.doc.clone(),
                });
            }
            objects.push(Object {
                name: def.name,
                fields,
            });
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }
}

/// Derive a schema-name hint from a service prefix and a type's declared
/// name. Suppressed for the default service so unscoped routes keep bare
/// type names.
pub fn preferred_schema_name(service: &str, graph: &TypeGraph, id: TypeId) -> Option<String> {
    if service.is_empty() || service == "API" {
        return None;
    }
    let (base, _) = graph.deref(id);
    let name = graph.struct_name(base)?;
    Some(format!("{service}{name}"))
}
