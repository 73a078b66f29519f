//! Shapes: the nodes of the model graph.

use crate::model::{ShapeId, Trait, TraitKind};
use std::collections::BTreeMap;

/// Simple (scalar) shape kinds from the prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Blob,
    Boolean,
    String,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Timestamp,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 10] = [
        PrimitiveKind::Blob,
        PrimitiveKind::Boolean,
        PrimitiveKind::String,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Integer,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Timestamp,
    ];

    /// Name of the prelude shape, e.g. `String` for `smithy.api#String`.
    pub fn prelude_name(self) -> &'static str {
        match self {
            PrimitiveKind::Blob => "Blob",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::String => "String",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Timestamp => "Timestamp",
        }
    }

    pub fn is_number(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Integer
                | PrimitiveKind::Long
                | PrimitiveKind::Float
                | PrimitiveKind::Double
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    // Aggregates hold ordered member ids (`ns#Shape$member`)
    Structure { members: Vec<ShapeId> },
    Union { members: Vec<ShapeId> },
    List { member: ShapeId },
    Map { key: ShapeId, value: ShapeId },

    // Simple shapes
    Enum { variants: Vec<String> },
    Primitive(PrimitiveKind),

    // Service shapes
    Operation {
        input: Option<ShapeId>,
        output: Option<ShapeId>,
        errors: Vec<ShapeId>,
    },
    Service {
        version: String,
        operations: Vec<ShapeId>,
    },

    Member { target: ShapeId },
}

/// A node in the model: an id, a kind, and at most one trait per [`TraitKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    id: ShapeId,
    kind: ShapeKind,
    traits: BTreeMap<TraitKind, Trait>,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind) -> Self {
        Self {
            id,
            kind,
            traits: BTreeMap::new(),
        }
    }

    /// Add (or replace) a trait.
    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.insert(t.kind(), t);
        self
    }

    /// Replace the whole trait set.
    pub fn with_traits(mut self, traits: impl IntoIterator<Item = Trait>) -> Self {
        self.traits = traits.into_iter().map(|t| (t.kind(), t)).collect();
        self
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn traits(&self) -> impl Iterator<Item = &Trait> {
        self.traits.values()
    }

    pub fn get_trait(&self, kind: TraitKind) -> Option<&Trait> {
        self.traits.get(&kind)
    }

    pub fn has_trait(&self, kind: TraitKind) -> bool {
        self.traits.contains_key(&kind)
    }

    pub fn documentation(&self) -> Option<&str> {
        match self.get_trait(TraitKind::Documentation) {
            Some(Trait::Documentation(docs)) => Some(docs),
            _ => None,
        }
    }

    pub fn is_structure(&self) -> bool {
        matches!(self.kind, ShapeKind::Structure { .. })
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, ShapeKind::Union { .. })
    }

    pub fn is_error(&self) -> bool {
        self.has_trait(TraitKind::Error)
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self.kind {
            ShapeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Ordered member ids of a structure or union; empty for everything else.
    pub fn member_ids(&self) -> &[ShapeId] {
        match &self.kind {
            ShapeKind::Structure { members } | ShapeKind::Union { members } => members,
            _ => &[],
        }
    }

    /// Target of a member shape.
    pub fn target(&self) -> Option<&ShapeId> {
        match &self.kind {
            ShapeKind::Member { target } => Some(target),
            _ => None,
        }
    }

    /// The member name of a member shape (`name` in `ns#Struct$name`).
    pub fn member_name(&self) -> Option<&str> {
        self.id.member()
    }

    /// Shape ids this shape points at, in declaration order.
    pub fn references(&self) -> Vec<&ShapeId> {
        match &self.kind {
            ShapeKind::Structure { members } | ShapeKind::Union { members } => {
                members.iter().collect()
            }
            ShapeKind::List { member } => vec![member],
            ShapeKind::Map { key, value } => vec![key, value],
            ShapeKind::Operation {
                input,
                output,
                errors,
            } => input
                .iter()
                .chain(output.iter())
                .chain(errors.iter())
                .collect(),
            ShapeKind::Service { operations, .. } => operations.iter().collect(),
            ShapeKind::Member { target } => vec![target],
            ShapeKind::Enum { .. } | ShapeKind::Primitive(_) => Vec::new(),
        }
    }

    /// Copy this shape under a new root id.
    ///
    /// Member ids held by aggregates are re-parented onto `id`; the member shapes
    /// themselves must be copied separately.
    pub(crate) fn reidentify(&self, id: ShapeId) -> Shape {
        let reparent = |member: &ShapeId| match member.member() {
            Some(name) => id.with_member(name),
            None => member.clone(),
        };
        let kind = match &self.kind {
            ShapeKind::Structure { members } => ShapeKind::Structure {
                members: members.iter().map(reparent).collect(),
            },
            ShapeKind::Union { members } => ShapeKind::Union {
                members: members.iter().map(reparent).collect(),
            },
            ShapeKind::List { member } => ShapeKind::List {
                member: reparent(member),
            },
            ShapeKind::Map { key, value } => ShapeKind::Map {
                key: reparent(key),
                value: reparent(value),
            },
            other => other.clone(),
        };
        Shape {
            id,
            kind,
            traits: self.traits.clone(),
        }
    }

    /// Member ids owned by this shape, including list and map members.
    pub(crate) fn owned_members(&self) -> Vec<&ShapeId> {
        match &self.kind {
            ShapeKind::Structure { members } | ShapeKind::Union { members } => {
                members.iter().collect()
            }
            ShapeKind::List { member } => vec![member],
            ShapeKind::Map { key, value } => vec![key, value],
            _ => Vec::new(),
        }
    }

    /// Point a member shape at a different target. No-op for non-members.
    pub(crate) fn retarget(mut self, new_target: ShapeId) -> Shape {
        if let ShapeKind::Member { target } = &mut self.kind {
            *target = new_target;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ShapeId {
        ShapeId::parse(s).unwrap()
    }

    #[test]
    fn test_one_trait_per_kind() {
        let shape = Shape::new(id("ns#Name"), ShapeKind::Primitive(PrimitiveKind::String))
            .with_trait(Trait::Documentation("first".into()))
            .with_trait(Trait::Documentation("second".into()));
        assert_eq!(shape.traits().count(), 1);
        assert_eq!(shape.documentation(), Some("second"));
    }

    #[test]
    fn test_reidentify_reparents_members() {
        let shape = Shape::new(
            id("ns#Old"),
            ShapeKind::Map {
                key: id("ns#Old$key"),
                value: id("ns#Old$value"),
            },
        );
        let copy = shape.reidentify(id("ns#New"));
        assert_eq!(copy.id(), &id("ns#New"));
        assert_eq!(
            copy.references(),
            vec![&id("ns#New$key"), &id("ns#New$value")]
        );
    }

    #[test]
    fn test_operation_references_in_order() {
        let op = Shape::new(
            id("ns#Op"),
            ShapeKind::Operation {
                input: Some(id("ns#In")),
                output: None,
                errors: vec![id("ns#E1"), id("ns#E2")],
            },
        );
        let refs: Vec<_> = op.references().into_iter().map(ToString::to_string).collect();
        assert_eq!(refs, ["ns#In", "ns#E1", "ns#E2"]);
    }
}
