#![forbid(unsafe_code)]

//! Boundary arithmetic for splicing ranges in and out of a nested set.
//!
//! Insertion points are always the boundary value immediately before the spliced content:
//! inserting at point `p` makes the new content start at `p + 1`, and every boundary `> p`
//! moves right by the inserted width.

use crate::model::Bounds;

/// Uniform shift of every boundary value strictly greater than `after`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shift {
    pub after: i64,
    pub delta: i64,
}

/// How a [`Shift`] touches one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftEffect {
    Untouched,
    /// Ancestor of the splice: only `right` moves.
    RightOnly,
    /// Positioned after the splice: both boundaries move.
    Both,
}

impl Shift {
    pub const fn apply(self, value: i64) -> i64 {
        if value > self.after {
            value + self.delta
        } else {
            value
        }
    }

    pub const fn apply_bounds(self, bounds: Bounds) -> Bounds {
        Bounds::new(self.apply(bounds.left), self.apply(bounds.right))
    }

    pub const fn effect(self, bounds: Bounds) -> ShiftEffect {
        if bounds.left > self.after {
            ShiftEffect::Both
        } else if bounds.right > self.after {
            ShiftEffect::RightOnly
        } else {
            ShiftEffect::Untouched
        }
    }
}

/// Opens a gap of `width` boundary values right after `point`.
pub const fn widen_for_insert(point: i64, width: i64) -> Shift {
    Shift {
        after: point,
        delta: width,
    }
}

/// Closes the gap left behind by `removed`.
pub const fn narrow_for_delete(removed: Bounds) -> Shift {
    Shift {
        after: removed.right,
        delta: -removed.width(),
    }
}

/// Bounds of a freshly created leaf spliced in at `point`.
pub const fn leaf_at(point: i64) -> Bounds {
    Bounds::new(point + 1, point + 2)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelocationError {
    /// Target point lies inside the moving subtree.
    IntoOwnSubtree,
    /// Target point is the subtree's current position.
    Unchanged,
}

/// A subtree move expressed as detach, re-point, attach.
///
/// Points and bounds of the *source* are in the pre-detach numbering; `attach` and `landing`
/// are in the post-detach numbering, which is what the store observes once `detach` ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    pub source: Bounds,
    pub detach: Shift,
    pub attach: Shift,
    pub landing: Bounds,
}

impl Relocation {
    pub const fn width(&self) -> i64 {
        self.source.width()
    }

    /// Uniform offset applied to every node inside the moving subtree.
    pub const fn offset(&self) -> i64 {
        self.landing.left - self.source.left
    }

    pub const fn moves_subtree_member(&self, bounds: Bounds) -> bool {
        self.source.left <= bounds.left && bounds.right <= self.source.right
    }

    /// Final bounds of any node of the tree, given its pre-move bounds.
    pub const fn apply_bounds(&self, bounds: Bounds) -> Bounds {
        if self.moves_subtree_member(bounds) {
            bounds.offset(self.offset())
        } else {
            self.attach.apply_bounds(self.detach.apply_bounds(bounds))
        }
    }
}

/// Plans moving the subtree `source` so it starts right after `target_point`.
///
/// `target_point` uses the pre-detach numbering; the width used for both shifts is the
/// pre-detach subtree width.
pub fn relocate_subtree(source: Bounds, target_point: i64) -> Result<Relocation, RelocationError> {
    if target_point == source.left - 1 || target_point == source.right {
        return Err(RelocationError::Unchanged);
    }
    if source.encloses_point(target_point) {
        return Err(RelocationError::IntoOwnSubtree);
    }

    let width = source.width();
    let detach = narrow_for_delete(source);
    let point = if target_point > source.right {
        target_point - width
    } else {
        target_point
    };
    let attach = widen_for_insert(point, width);

    Ok(Relocation {
        source,
        detach,
        attach,
        landing: Bounds::new(point + 1, point + width),
    })
}

/// Where, relative to an existing node, content should be spliced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    FirstChildOf(Bounds),
    LastChildOf(Bounds),
    Before(Bounds),
    After(Bounds),
}

impl Anchor {
    pub const fn point(self) -> i64 {
        match self {
            Anchor::FirstChildOf(parent) => parent.left,
            Anchor::LastChildOf(parent) => parent.right - 1,
            Anchor::Before(sibling) => sibling.left - 1,
            Anchor::After(sibling) => sibling.right,
        }
    }
}
