//! Type descriptors supplied by the DTO-introspection layer.
//!
//! Languages with runtime reflection hand the engine live type objects; here
//! the host describes each DTO shape once, up front, into a [`TypeGraph`]
//! arena. Nodes are addressed by copyable [`TypeId`] tokens, so cyclic and
//! self-referential shapes can be described without building reference
//! cycles in memory: declare the struct first, then attach its fields.

/// Stable identity token for a node in a [`TypeGraph`].
///
/// Two ids are the same type exactly when they were produced by the same
/// graph call; structurally identical shapes declared twice stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

/// Scalar kinds understood by every renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Bool,
    String,
    Int32,
    Int64,
    Uint64,
    Float32,
    Float64,
    /// Dynamic/untyped payload. Renders as the universal "any" sentinel.
    Any,
}

/// Map key classification. Only string-keyed maps render structurally;
/// anything else falls back to a generic object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKey {
    String,
    Other,
}

/// Shape of a single type node.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Scalar(Scalar),
    /// Indirection. Drives `nullable`, nothing else.
    Pointer(TypeId),
    List(TypeId),
    Map { key: MapKey, value: TypeId },
    Struct(StructShape),
}

/// A structured type. An empty `name` marks the shape anonymous: it is
/// rendered inline at point of use and never becomes a top-level object.
#[derive(Debug, Clone)]
pub struct StructShape {
    pub module_path: String,
    pub name: String,
    pub fields: Vec<FieldShape>,
}

/// Query-parameter binding for a request field.
#[derive(Debug, Clone)]
pub struct QueryBinding {
    /// Parameter name; empty means "derive from the field name".
    pub name: String,
    pub optional: bool,
}

/// Per-field metadata, the moral equivalent of a struct tag.
#[derive(Debug, Clone)]
pub struct FieldShape {
    /// Declared field name.
    pub name: String,
    pub ty: TypeId,
    /// Explicit wire name; `None` derives `lower_first(name)`.
    pub wire_name: Option<String>,
    /// The field may be entirely absent from the payload.
    pub omittable: bool,
    pub doc: String,
    /// Marks the field a query parameter instead of a body field.
    pub query: Option<QueryBinding>,
    /// Excluded from serialization entirely.
    pub ignored: bool,
}

impl FieldShape {
    pub fn new(name: &str, ty: TypeId) -> Self {
        Self {
            name: name.to_string(),
            ty,
            wire_name: None,
            omittable: false,
            doc: String::new(),
            query: None,
            ignored: false,
        }
    }

    /// Set an explicit wire name.
    #[must_use]
    pub fn wire_name(mut self, name: &str) -> Self {
        self.wire_name = Some(name.to_string());
        self
    }

    /// Mark the field as possibly absent from the payload.
    #[must_use]
    pub fn omittable(mut self) -> Self {
        self.omittable = true;
        self
    }

    #[must_use]
    pub fn doc(mut self, text: &str) -> Self {
        self.doc = text.trim().to_string();
        self
    }

    /// Bind the field to a query parameter. An empty `name` derives the
    /// parameter name from the field name.
    #[must_use]
    pub fn query(mut self, name: &str, optional: bool) -> Self {
        self.query = Some(QueryBinding {
            name: name.to_string(),
            optional,
        });
        self
    }

    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Wire name as it appears in the serialized payload, or `None` when the
    /// field does not serialize at all.
    pub(crate) fn resolved_wire_name(&self) -> Option<String> {
        if self.ignored || self.name.is_empty() {
            return None;
        }
        match &self.wire_name {
            Some(name) if !name.is_empty() => Some(name.clone()),
            _ => Some(crate::util::lower_first(&self.name)),
        }
    }

    /// Query parameter name, falling back to the derived field name.
    pub(crate) fn query_param_name(&self) -> Option<String> {
        let binding = self.query.as_ref()?;
        if binding.name.is_empty() {
            Some(crate::util::lower_first(&self.name))
        } else {
            Some(binding.name.clone())
        }
    }
}

/// Arena of type nodes, built once per generation pass.
#[derive(Debug, Default)]
pub struct TypeGraph {
    nodes: Vec<TypeKind>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(kind);
        id
    }

    pub fn scalar(&mut self, scalar: Scalar) -> TypeId {
        self.push(TypeKind::Scalar(scalar))
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.push(TypeKind::Pointer(elem))
    }

    pub fn list(&mut self, elem: TypeId) -> TypeId {
        self.push(TypeKind::List(elem))
    }

    pub fn string_map(&mut self, value: TypeId) -> TypeId {
        self.push(TypeKind::Map {
            key: MapKey::String,
            value,
        })
    }

    pub fn map(&mut self, key: MapKey, value: TypeId) -> TypeId {
        self.push(TypeKind::Map { key, value })
    }

    /// Declare a named struct with no fields yet. Pair with [`set_fields`]
    /// so self-referential shapes can point back at their own id.
    ///
    /// [`set_fields`]: TypeGraph::set_fields
    pub fn declare_struct(&mut self, module_path: &str, name: &str) -> TypeId {
        self.push(TypeKind::Struct(StructShape {
            module_path: module_path.to_string(),
            name: name.to_string(),
            fields: Vec::new(),
        }))
    }

    /// Attach fields to a previously declared struct. No-op for non-structs.
    pub fn set_fields(&mut self, id: TypeId, fields: Vec<FieldShape>) {
        if let Some(TypeKind::Struct(shape)) = self.nodes.get_mut(id.0 as usize) {
            shape.fields = fields;
        }
    }

    /// Declare a named struct and its fields in one call.
    pub fn named_struct(&mut self, module_path: &str, name: &str, fields: Vec<FieldShape>) -> TypeId {
        let id = self.declare_struct(module_path, name);
        self.set_fields(id, fields);
        id
    }

    /// Declare an anonymous struct, rendered inline at point of use.
    pub fn anon_struct(&mut self, fields: Vec<FieldShape>) -> TypeId {
        self.push(TypeKind::Struct(StructShape {
            module_path: String::new(),
            name: String::new(),
            fields,
        }))
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.nodes[id.0 as usize]
    }

    /// Resolve pointer chains to the base type, reporting whether any
    /// indirection was crossed.
    pub fn deref(&self, id: TypeId) -> (TypeId, bool) {
        let mut current = id;
        let mut nullable = false;
        while let TypeKind::Pointer(elem) = self.kind(current) {
            nullable = true;
            current = *elem;
        }
        (current, nullable)
    }

    pub(crate) fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Pointer(_))
    }

    /// Declared name of a named struct; `None` for everything else.
    pub fn struct_name(&self, id: TypeId) -> Option<&str> {
        match self.kind(id) {
            TypeKind::Struct(shape) if !shape.name.is_empty() => Some(&shape.name),
            _ => None,
        }
    }

    pub(crate) fn struct_shape(&self, id: TypeId) -> Option<&StructShape> {
        match self.kind(id) {
            TypeKind::Struct(shape) => Some(shape),
            _ => None,
        }
    }

    /// Fully-qualified name (`module::Name`), used for override lookup.
    pub fn qualified_name(&self, id: TypeId) -> Option<String> {
        let shape = self.struct_shape(id)?;
        if shape.name.is_empty() {
            return None;
        }
        if shape.module_path.is_empty() {
            return Some(shape.name.clone());
        }
        Some(format!("{}::{}", shape.module_path, shape.name))
    }

    /// Synthesized fallback name derived from the fully-qualified path.
    pub(crate) fn synthesized_name(&self, id: TypeId) -> String {
        let Some(shape) = self.struct_shape(id) else {
            return String::new();
        };
        if shape.module_path.is_empty() {
            return shape.name.clone();
        }
        let path = shape
            .module_path
            .replace("::", "_")
            .replace(['/', '.'], "_");
        format!("{}_{}", path, shape.name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn deref_reports_indirection() {
        let mut graph = TypeGraph::new();
        let s = graph.scalar(Scalar::String);
        let p = graph.pointer(s);
        let pp = graph.pointer(p);

        assert_eq!(graph.deref(s), (s, false));
        assert_eq!(graph.deref(p), (s, true));
        assert_eq!(graph.deref(pp), (s, true));
    }

    #[test]
    fn wire_name_resolution() {
        let mut graph = TypeGraph::new();
        let s = graph.scalar(Scalar::String);

        let derived = FieldShape::new("UserName", s);
        assert_eq!(derived.resolved_wire_name().as_deref(), Some("userName"));

        let acronym = FieldShape::new("ID", s);
        assert_eq!(acronym.resolved_wire_name().as_deref(), Some("id"));

        let explicit = FieldShape::new("UserName", s).wire_name("user_name");
        assert_eq!(explicit.resolved_wire_name().as_deref(), Some("user_name"));

        let ignored = FieldShape::new("UserName", s).ignored();
        assert_eq!(ignored.resolved_wire_name(), None);
    }

    #[test]
    fn synthesized_name_collapses_path() {
        let mut graph = TypeGraph::new();
        let id = graph.named_struct("acme::models", "User", Vec::new());
        assert_eq!(graph.synthesized_name(id), "acme_models_User");
        assert_eq!(graph.qualified_name(id).as_deref(), Some("acme::models::User"));
    }

    #[test]
    fn two_phase_struct_allows_self_reference() {
        let mut graph = TypeGraph::new();
        let node = graph.declare_struct("demo", "Node");
        let next = graph.pointer(node);
        graph.set_fields(node, vec![FieldShape::new("Next", next)]);

        let shape = graph.struct_shape(node).unwrap();
        assert_eq!(shape.fields.len(), 1);
        assert_eq!(graph.deref(shape.fields[0].ty), (node, true));
    }
}
