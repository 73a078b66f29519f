use crate::model::{Model, Shape, ShapeId};
use std::collections::BTreeSet;

/// Depth-first traversal of the shapes reachable from a root.
///
/// The walk is iterative, so deeply nested or recursive models cannot overflow the
/// stack. Children are visited in declaration order.
pub struct Walker<'a> {
    model: &'a Model,
}

impl<'a> Walker<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Every shape reachable from `root`, including `root` itself.
    pub fn walk_shapes(&self, root: &ShapeId) -> Vec<&'a Shape> {
        let mut visited = BTreeSet::new();
        self.walk_shapes_with(root, &mut visited)
    }

    /// Like [`Walker::walk_shapes`], skipping (and extending) `visited`.
    ///
    /// Sharing one visited set across several walks yields each shape at most once
    /// over all of them.
    pub fn walk_shapes_with(
        &self,
        root: &ShapeId,
        visited: &mut BTreeSet<ShapeId>,
    ) -> Vec<&'a Shape> {
        let mut found = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            let Some(shape) = self.model.get(&id) else {
                continue;
            };
            found.push(shape);
            stack.extend(shape.references().into_iter().rev().cloned());
        }
        found
    }
}
