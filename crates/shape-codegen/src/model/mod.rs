//! The shape graph.
//!
//! A [`Model`] is an immutable, sorted map from [`ShapeId`] to [`Shape`]. Models are
//! assembled through [`ModelBuilder`], which always includes the prelude primitives and
//! refuses to build a graph with dangling references.

mod shape;
mod shape_id;
mod traits;
mod walker;

pub use shape::{PrimitiveKind, Shape, ShapeKind};
pub use shape_id::ShapeId;
pub use traits::{ErrorFault, Trait, TraitKind};
pub use walker::Walker;

use crate::error::{CodegenError, Result};
use std::collections::BTreeMap;

/// Namespace of the built-in primitive shapes.
pub const PRELUDE_NAMESPACE: &str = "smithy.api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    shapes: BTreeMap<ShapeId, Shape>,
}

impl Model {
    /// A builder pre-populated with the prelude.
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// A builder holding a copy of every shape in this model.
    pub fn to_builder(&self) -> ModelBuilder {
        ModelBuilder {
            shapes: self.shapes.clone(),
            error: None,
        }
    }

    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Look up a shape that must exist.
    pub fn expect_shape(&self, id: &ShapeId) -> Result<&Shape> {
        self.get(id)
            .ok_or_else(|| CodegenError::MissingShape(id.clone()))
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    /// All shapes, sorted by id.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn structures(&self) -> impl Iterator<Item = &Shape> {
        self.shapes().filter(|s| s.is_structure())
    }

    pub fn operations(&self) -> impl Iterator<Item = &Shape> {
        self.shapes()
            .filter(|s| matches!(s.kind(), ShapeKind::Operation { .. }))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Resolve the target of a member shape.
    pub fn member_target(&self, member: &Shape) -> Result<&Shape> {
        let target = member.target().ok_or_else(|| CodegenError::UnexpectedShapeKind {
            id: member.id().clone(),
            expected: "member",
        })?;
        self.expect_shape(target)
    }

    /// Member shapes of a structure or union, in declaration order.
    pub fn members_of(&self, shape: &Shape) -> Result<Vec<&Shape>> {
        shape
            .member_ids()
            .iter()
            .map(|id| self.expect_shape(id))
            .collect()
    }

    /// Operations bound to `service`, sorted by id.
    pub fn service_operations(&self, service: &ShapeId) -> Result<Vec<&Shape>> {
        let shape = self.expect_shape(service)?;
        let ShapeKind::Service { operations, .. } = shape.kind() else {
            return Err(CodegenError::UnexpectedShapeKind {
                id: service.clone(),
                expected: "service",
            });
        };
        let mut operations = operations
            .iter()
            .map(|id| self.expect_shape(id))
            .collect::<Result<Vec<_>>>()?;
        operations.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(operations)
    }

    /// Check that every reference in the graph resolves.
    pub fn validate(&self) -> Result<()> {
        for shape in self.shapes() {
            for reference in shape.references() {
                if !self.contains(reference) {
                    return Err(CodegenError::DanglingReference {
                        from: shape.id().clone(),
                        to: reference.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A member declaration used by the [`ModelBuilder`] convenience methods.
#[derive(Debug, Clone)]
pub struct MemberDef {
    name: String,
    target: String,
    traits: Vec<Trait>,
}

impl MemberDef {
    /// Member `name` targeting the absolute shape id `target`.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            traits: Vec::new(),
        }
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }
}

/// Incrementally assembles a [`Model`].
///
/// The convenience methods take shape ids as strings; the first id that fails to
/// parse is reported by [`ModelBuilder::build`].
///
/// # Example
///
/// ```
/// use shape_codegen::model::{MemberDef, Model, Trait};
///
/// let model = Model::builder()
///     .structure("com.example#Person", [], [
///         MemberDef::new("name", "smithy.api#String").with_trait(Trait::Required),
///     ])
///     .build()
///     .unwrap();
/// assert!(model.structures().any(|s| s.id().name() == "Person"));
/// ```
#[derive(Debug)]
pub struct ModelBuilder {
    shapes: BTreeMap<ShapeId, Shape>,
    error: Option<CodegenError>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        let shapes = PrimitiveKind::ALL
            .iter()
            .map(|kind| {
                let id = ShapeId::from_parts(PRELUDE_NAMESPACE, kind.prelude_name());
                (id.clone(), Shape::new(id, ShapeKind::Primitive(*kind)))
            })
            .collect();
        Self {
            shapes,
            error: None,
        }
    }
}

impl ModelBuilder {
    /// Add a shape, replacing any shape with the same id.
    pub fn add_shape(&mut self, shape: Shape) -> &mut Self {
        self.shapes.insert(shape.id().clone(), shape);
        self
    }

    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    /// Add a structure and its member shapes.
    pub fn structure(
        &mut self,
        id: &str,
        traits: impl IntoIterator<Item = Trait>,
        members: impl IntoIterator<Item = MemberDef>,
    ) -> &mut Self {
        self.aggregate(id, traits, members, |members| ShapeKind::Structure {
            members,
        })
    }

    /// Add a union and its member shapes.
    pub fn union(
        &mut self,
        id: &str,
        traits: impl IntoIterator<Item = Trait>,
        members: impl IntoIterator<Item = MemberDef>,
    ) -> &mut Self {
        self.aggregate(id, traits, members, |members| ShapeKind::Union { members })
    }

    /// Add a list whose `member` targets `target`.
    pub fn list(
        &mut self,
        id: &str,
        traits: impl IntoIterator<Item = Trait>,
        target: &str,
    ) -> &mut Self {
        let Some(id) = self.parse(id) else {
            return self;
        };
        if let Some(member) = self.add_member(&id, MemberDef::new("member", target)) {
            let shape = Shape::new(id, ShapeKind::List { member }).with_traits(traits);
            self.add_shape(shape);
        }
        self
    }

    /// Add a map with `key` and `value` members.
    pub fn map(&mut self, id: &str, key: &str, value: &str) -> &mut Self {
        let Some(id) = self.parse(id) else {
            return self;
        };
        let key = self.add_member(&id, MemberDef::new("key", key));
        let value = self.add_member(&id, MemberDef::new("value", value));
        if let (Some(key), Some(value)) = (key, value) {
            self.add_shape(Shape::new(id, ShapeKind::Map { key, value }));
        }
        self
    }

    /// Add a standalone primitive shape, typically to carry constraint traits.
    pub fn primitive(
        &mut self,
        id: &str,
        kind: PrimitiveKind,
        traits: impl IntoIterator<Item = Trait>,
    ) -> &mut Self {
        if let Some(id) = self.parse(id) {
            self.add_shape(Shape::new(id, ShapeKind::Primitive(kind)).with_traits(traits));
        }
        self
    }

    pub fn enumeration(&mut self, id: &str, variants: &[&str]) -> &mut Self {
        if let Some(id) = self.parse(id) {
            let variants = variants.iter().map(|v| v.to_string()).collect();
            self.add_shape(Shape::new(id, ShapeKind::Enum { variants }));
        }
        self
    }

    pub fn operation(
        &mut self,
        id: &str,
        input: Option<&str>,
        output: Option<&str>,
        errors: &[&str],
    ) -> &mut Self {
        let Some(id) = self.parse(id) else {
            return self;
        };
        let input = input.and_then(|i| self.parse(i));
        let output = output.and_then(|o| self.parse(o));
        let errors = errors.iter().filter_map(|e| self.parse(e)).collect();
        self.add_shape(Shape::new(
            id,
            ShapeKind::Operation {
                input,
                output,
                errors,
            },
        ))
    }

    pub fn service(
        &mut self,
        id: &str,
        version: &str,
        operations: &[&str],
        traits: impl IntoIterator<Item = Trait>,
    ) -> &mut Self {
        let Some(id) = self.parse(id) else {
            return self;
        };
        let operations = operations.iter().filter_map(|o| self.parse(o)).collect();
        let shape = Shape::new(
            id,
            ShapeKind::Service {
                version: version.to_string(),
                operations,
            },
        )
        .with_traits(traits);
        self.add_shape(shape)
    }

    /// Validate and freeze the model.
    pub fn build(&mut self) -> Result<Model> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let model = Model {
            shapes: self.shapes.clone(),
        };
        model.validate()?;
        Ok(model)
    }

    fn aggregate(
        &mut self,
        id: &str,
        traits: impl IntoIterator<Item = Trait>,
        members: impl IntoIterator<Item = MemberDef>,
        kind: impl FnOnce(Vec<ShapeId>) -> ShapeKind,
    ) -> &mut Self {
        let Some(id) = self.parse(id) else {
            return self;
        };
        let member_ids = members
            .into_iter()
            .filter_map(|member| self.add_member(&id, member))
            .collect();
        let shape = Shape::new(id, kind(member_ids)).with_traits(traits);
        self.add_shape(shape)
    }

    fn add_member(&mut self, container: &ShapeId, member: MemberDef) -> Option<ShapeId> {
        let target = self.parse(&member.target)?;
        let member_id = self.parse(&format!("{container}${}", member.name))?;
        let shape = Shape::new(member_id.clone(), ShapeKind::Member { target })
            .with_traits(member.traits);
        self.add_shape(shape);
        Some(member_id)
    }

    fn parse(&mut self, raw: &str) -> Option<ShapeId> {
        match ShapeId::parse(raw) {
            Ok(id) => Some(id),
            Err(err) => {
                self.error.get_or_insert(err);
                None
            }
        }
    }
}
