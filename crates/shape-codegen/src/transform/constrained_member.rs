//! Constrained-member extraction.
//!
//! Rust cannot attach constraint semantics to a struct field in place, so every
//! structure member carrying constraint traits is repointed at a new standalone shape
//! that carries those constraints instead:
//!
//! ```text
//! structure Person { @length(min: 1) name: String }
//! ```
//!
//! becomes
//!
//! ```text
//! structure Person { name: RefactoredPersonName }
//! @length(min: 1) @refactored(Person$name) string RefactoredPersonName
//! ```

use crate::error::{CodegenError, Result};
use crate::model::{Model, Shape, ShapeId, ShapeKind, Trait, Walker};
use crate::naming::capitalize;
use std::collections::BTreeSet;
use tracing::{debug, info};

struct MemberTransformation {
    new_shape: Shape,
    new_members: Vec<Shape>,
    member: Shape,
    traits_to_keep: Vec<Trait>,
}

/// Extract constraint traits from every structure member reachable from an operation's
/// input or output.
///
/// Operations are visited in id order, input before output, sharing one visited set,
/// so a structure reachable from several operations is refactored once. Reapplying the
/// transform to its own output returns the model unchanged.
pub fn transform(model: Model) -> Result<Model> {
    let walker = Walker::new(&model);
    let mut visited = BTreeSet::new();
    let mut generated = BTreeSet::new();
    let mut transformations = Vec::new();

    for operation in model.operations() {
        let ShapeKind::Operation { input, output, .. } = operation.kind() else {
            continue;
        };
        for root in input.iter().chain(output.iter()) {
            model.expect_shape(root)?;
            for shape in walker.walk_shapes_with(root, &mut visited) {
                if !shape.is_structure() {
                    continue;
                }
                for member in model.members_of(shape)? {
                    if let Some(t) = make_non_constrained(&model, member, &mut generated)? {
                        transformations.push(t);
                    }
                }
            }
        }
    }

    apply_transformations(model, transformations)
}

fn apply_transformations(model: Model, transformations: Vec<MemberTransformation>) -> Result<Model> {
    if transformations.is_empty() {
        return Ok(model);
    }
    info!(count = transformations.len(), "refactored constrained members");

    let mut builder = model.to_builder();
    for t in transformations {
        let new_id = t.new_shape.id().clone();
        builder.add_shape(t.new_shape);
        for member in t.new_members {
            builder.add_shape(member);
        }
        builder.add_shape(t.member.with_traits(t.traits_to_keep).retarget(new_id));
    }
    builder.build()
}

fn make_non_constrained(
    model: &Model,
    member: &Shape,
    generated: &mut BTreeSet<ShapeId>,
) -> Result<Option<MemberTransformation>> {
    let (constraints, others): (Vec<Trait>, Vec<Trait>) =
        member.traits().cloned().partition(Trait::is_constraint);
    if constraints.is_empty() {
        return Ok(None);
    }

    let target = model.member_target(member)?;
    if matches!(
        target.kind(),
        ShapeKind::Operation { .. } | ShapeKind::Service { .. } | ShapeKind::Member { .. }
    ) {
        return Err(CodegenError::UnbuildableConstrainedTarget {
            member: member.id().clone(),
            target: target.id().clone(),
        });
    }

    let new_id = refactored_shape_id(model, generated, member.id())?;
    generated.insert(new_id.clone());
    debug!(member = %member.id(), refactored = %new_id, "extracting constrained member");

    let provenance = Trait::Refactored {
        original: member.id().clone(),
    };
    let new_shape = target
        .reidentify(new_id.clone())
        .with_traits(constraints.into_iter().chain([provenance]));
    let new_members = target
        .owned_members()
        .into_iter()
        .map(|id| {
            let shape = model.expect_shape(id)?;
            let name = shape.member_name().unwrap_or_default();
            Ok(shape.reidentify(new_id.with_member(name)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(MemberTransformation {
        new_shape,
        new_members,
        member: member.clone(),
        traits_to_keep: others,
    }))
}

/// `Refactored{Struct}{Member}`, made unique against the model and this run.
///
/// Candidates are tried in this order:
/// 1. no suffix, then `_0` through `_99`
/// 2. `_` followed by the accumulated names of every structure in the model
fn refactored_shape_id(
    model: &Model,
    generated: &BTreeSet<ShapeId>,
    member: &ShapeId,
) -> Result<ShapeId> {
    let struct_name = member.name();
    let member_name = capitalize(member.member().unwrap_or_default());
    let make = |suffix: &str| member.with_name(format!("Refactored{struct_name}{member_name}{suffix}"));
    let is_unique = |id: &ShapeId| !model.contains(id) && !generated.contains(id);

    let mut suffix = String::new();
    for i in 0..=100 {
        let candidate = make(&suffix);
        if is_unique(&candidate) {
            return Ok(candidate);
        }
        suffix = format!("_{i}");
    }

    suffix = "_".to_string();
    for structure in model.structures() {
        suffix.push_str(structure.id().name());
        let candidate = make(&suffix);
        if is_unique(&candidate) {
            return Ok(candidate);
        }
    }

    Err(CodegenError::RefactoredNameExhausted {
        member: member.clone(),
    })
}
