//! Shared traversals over the body-part tree.
//!
//! Owner resolution, catalog ordering, group lookup and seller filtering all
//! go through `walk` (pre-order) or `fold` (post-order) so the tree is only
//! ever traversed one way.

use super::BodyPart;

/// One step of a pre-order walk.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a, 'p> {
    pub part: &'a BodyPart,
    /// Parents of `part`, outermost first. Empty for primals.
    pub ancestors: &'p [&'a BodyPart],
    /// Child indices from the primal list down to `part`.
    pub path: &'p [usize],
}

impl Visit<'_, '_> {
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    #[must_use]
    pub fn is_descendant_of(&self, part_id: &str) -> bool {
        self.ancestors.iter().any(|ancestor| ancestor.id == part_id)
    }
}

/// Visit every body part, parents before their sub-parts, in declaration order.
pub fn walk<'a, F>(parts: &'a [BodyPart], visit: &mut F)
where
    F: FnMut(Visit<'a, '_>),
{
    let mut ancestors = Vec::new();
    let mut path = Vec::new();
    walk_level(parts, &mut ancestors, &mut path, visit);
}

fn walk_level<'a, F>(
    parts: &'a [BodyPart],
    ancestors: &mut Vec<&'a BodyPart>,
    path: &mut Vec<usize>,
    visit: &mut F,
) where
    F: FnMut(Visit<'a, '_>),
{
    for (idx, part) in parts.iter().enumerate() {
        path.push(idx);
        visit(Visit {
            part,
            ancestors: ancestors.as_slice(),
            path: path.as_slice(),
        });
        ancestors.push(part);
        walk_level(&part.sub_parts, ancestors, path, visit);
        ancestors.pop();
        path.pop();
    }
}

/// Post-order fold: `combine` sees a part together with the already-folded
/// results of its sub-parts.
pub fn fold<T, F>(part: &BodyPart, combine: &mut F) -> T
where
    F: FnMut(&BodyPart, Vec<T>) -> T,
{
    let mut children = Vec::with_capacity(part.sub_parts.len());
    for child in &part.sub_parts {
        children.push(fold(child, combine));
    }
    combine(part, children)
}
