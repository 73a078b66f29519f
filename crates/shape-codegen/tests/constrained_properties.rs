use proptest::prelude::*;
use shape_codegen::model::{MemberDef, Model, ShapeId, Trait, TraitKind};
use shape_codegen::naming::capitalize;
use shape_codegen::transform::constrained_member;
use std::collections::BTreeSet;

/// A `Person` structure whose members all carry a length constraint, plus decoy
/// structures occupying some of the names the extraction would pick.
fn model(members: &BTreeSet<String>, taken: &BTreeSet<usize>) -> Model {
    let mut builder = Model::builder();
    let defs: Vec<MemberDef> = members
        .iter()
        .map(|name| {
            MemberDef::new(name.as_str(), "smithy.api#String")
                .with_trait(Trait::Length {
                    min: Some(1),
                    max: None,
                })
                .with_trait(Trait::Documentation(format!("The {name}.")))
        })
        .collect();
    builder.structure("ns#Person", [], defs);
    for name in members {
        for &k in taken {
            let suffix = if k == 0 { String::new() } else { format!("_{}", k - 1) };
            builder.structure(
                &format!("ns#RefactoredPerson{}{suffix}", capitalize(name)),
                [],
                [],
            );
        }
    }
    builder
        .operation("ns#PutPerson", Some("ns#Person"), None, &[])
        .service("ns#Svc", "1", &["ns#PutPerson"], [])
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn test_synthesized_names_are_fresh_and_distinct(
        members in prop::collection::btree_set("[a-z]{1,4}", 1..6),
        taken in prop::collection::btree_set(0usize..5, 0..4),
    ) {
        let original = model(&members, &taken);
        let transformed = constrained_member::transform(original.clone()).unwrap();

        let mut targets = BTreeSet::new();
        for name in &members {
            let member_id = ShapeId::parse(&format!("ns#Person${name}")).unwrap();
            let member = transformed.get(&member_id).unwrap();
            let target = member.target().unwrap().clone();

            prop_assert!(!original.contains(&target), "{target} already existed");
            prop_assert!(targets.insert(target.clone()), "{target} synthesized twice");

            prop_assert!(!member.has_trait(TraitKind::Length));
            prop_assert!(member.has_trait(TraitKind::Documentation));
            let new_shape = transformed.get(&target).unwrap();
            prop_assert!(new_shape.has_trait(TraitKind::Length));
            prop_assert_eq!(
                new_shape.get_trait(TraitKind::Refactored),
                Some(&Trait::Refactored { original: member_id })
            );
        }
    }

    #[test]
    fn test_extraction_is_idempotent(
        members in prop::collection::btree_set("[a-z]{1,4}", 1..6),
        taken in prop::collection::btree_set(0usize..5, 0..4),
    ) {
        let once = constrained_member::transform(model(&members, &taken)).unwrap();
        let twice = constrained_member::transform(once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }
}
