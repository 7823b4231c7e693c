//! Core types for spark-relations.
//!
//! These types define the foundation that everything builds on:
//! geometry values, the closed set of relation kinds, and the flags
//! describing which part of a node changed.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// =============================================================================
// Geometry
// =============================================================================

/// A 2D value: a position in parent space or an extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new value.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component along an axis.
    #[inline]
    pub const fn get(self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Set the component along an axis.
    #[inline]
    pub fn set(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
        }
    }

    /// Check whether both components are zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

// =============================================================================
// Change Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Which part of a node's geometry changed (or is being listened to).
    ///
    /// Combine with bitwise OR: `ChangeFlags::POSITION | ChangeFlags::SIZE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChangeFlags: u8 {
        const NONE = 0;
        const POSITION = 1 << 0;
        const SIZE = 1 << 1;
    }
}

// =============================================================================
// Relation Types
// =============================================================================

/// An anchor point along one axis.
///
/// Leading is left/top, Center is center/middle, Trailing is right/bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Leading,
    Center,
    Trailing,
}

impl Edge {
    /// Fraction of the extent at which this anchor sits.
    #[inline]
    pub const fn factor(self) -> f32 {
        match self {
            Edge::Leading => 0.0,
            Edge::Center => 0.5,
            Edge::Trailing => 1.0,
        }
    }
}

/// The family a relation belongs to, with its owner-side and target-side anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationShape {
    /// Owner anchor follows target anchor; size untouched.
    Anchor { owner: Edge, target: Edge },
    /// Owner extent follows target extent.
    Size,
    /// One owner edge follows the target anchor, the opposite edge stays put.
    /// `owner` is always Leading or Trailing.
    Extension { owner: Edge, target: Edge },
}

/// Relation kind between an owner and its target.
///
/// 24 canonical kinds in four families plus the compound [`RelationType::Size`],
/// which expands to `Width + Height` when registered.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    LeftLeft = 0,
    LeftCenter = 1,
    LeftRight = 2,
    CenterCenter = 3,
    RightLeft = 4,
    RightCenter = 5,
    RightRight = 6,

    TopTop = 7,
    TopMiddle = 8,
    TopBottom = 9,
    MiddleMiddle = 10,
    BottomTop = 11,
    BottomMiddle = 12,
    BottomBottom = 13,

    Width = 14,
    Height = 15,

    LeftExtLeft = 16,
    LeftExtRight = 17,
    RightExtLeft = 18,
    RightExtRight = 19,
    TopExtTop = 20,
    TopExtBottom = 21,
    BottomExtTop = 22,
    BottomExtBottom = 23,

    Size = 24,
}

impl RelationType {
    /// The 24 canonical kinds, in declaration order (excludes `Size`).
    pub const ALL: [RelationType; 24] = [
        RelationType::LeftLeft,
        RelationType::LeftCenter,
        RelationType::LeftRight,
        RelationType::CenterCenter,
        RelationType::RightLeft,
        RelationType::RightCenter,
        RelationType::RightRight,
        RelationType::TopTop,
        RelationType::TopMiddle,
        RelationType::TopBottom,
        RelationType::MiddleMiddle,
        RelationType::BottomTop,
        RelationType::BottomMiddle,
        RelationType::BottomBottom,
        RelationType::Width,
        RelationType::Height,
        RelationType::LeftExtLeft,
        RelationType::LeftExtRight,
        RelationType::RightExtLeft,
        RelationType::RightExtRight,
        RelationType::TopExtTop,
        RelationType::TopExtBottom,
        RelationType::BottomExtTop,
        RelationType::BottomExtBottom,
    ];

    /// Canonical kinds this relation registers as.
    pub fn expand(self) -> &'static [RelationType] {
        static CANONICAL: [RelationType; 24] = RelationType::ALL;
        match self {
            RelationType::Size => &CANONICAL[14..=15],
            other => {
                let index = other as usize;
                &CANONICAL[index..=index]
            }
        }
    }

    /// Axis this relation acts on. `Size` reports X; it never reaches the formulas.
    pub const fn axis(self) -> Axis {
        use RelationType::*;
        match self {
            LeftLeft | LeftCenter | LeftRight | CenterCenter | RightLeft | RightCenter
            | RightRight | Width | LeftExtLeft | LeftExtRight | RightExtLeft | RightExtRight
            | Size => Axis::X,
            TopTop | TopMiddle | TopBottom | MiddleMiddle | BottomTop | BottomMiddle
            | BottomBottom | Height | TopExtTop | TopExtBottom | BottomExtTop
            | BottomExtBottom => Axis::Y,
        }
    }

    /// Family and anchors of this relation.
    pub const fn shape(self) -> RelationShape {
        use Edge::*;
        use RelationShape::{Anchor, Extension};
        use RelationType::*;
        match self {
            LeftLeft | TopTop => Anchor { owner: Leading, target: Leading },
            LeftCenter | TopMiddle => Anchor { owner: Leading, target: Center },
            LeftRight | TopBottom => Anchor { owner: Leading, target: Trailing },
            CenterCenter | MiddleMiddle => Anchor { owner: Center, target: Center },
            RightLeft | BottomTop => Anchor { owner: Trailing, target: Leading },
            RightCenter | BottomMiddle => Anchor { owner: Trailing, target: Center },
            RightRight | BottomBottom => Anchor { owner: Trailing, target: Trailing },
            Width | Height | Size => RelationShape::Size,
            LeftExtLeft | TopExtTop => Extension { owner: Leading, target: Leading },
            LeftExtRight | TopExtBottom => Extension { owner: Leading, target: Trailing },
            RightExtLeft | BottomExtTop => Extension { owner: Trailing, target: Leading },
            RightExtRight | BottomExtBottom => Extension { owner: Trailing, target: Trailing },
        }
    }

    /// Whether a change to the owner's own size must shift its position.
    ///
    /// True for anchor pairs whose owner-side anchor is not the leading edge.
    pub const fn affected_by_self_size(self) -> bool {
        matches!(
            self.shape(),
            RelationShape::Anchor { owner: Edge::Center | Edge::Trailing, .. }
        )
    }

    /// Canonical side-pair token (`"left-left"`, `"rightext-right"`, ...).
    pub const fn as_side_pair(self) -> &'static str {
        use RelationType::*;
        match self {
            LeftLeft => "left-left",
            LeftCenter => "left-center",
            LeftRight => "left-right",
            CenterCenter => "center-center",
            RightLeft => "right-left",
            RightCenter => "right-center",
            RightRight => "right-right",
            TopTop => "top-top",
            TopMiddle => "top-middle",
            TopBottom => "top-bottom",
            MiddleMiddle => "middle-middle",
            BottomTop => "bottom-top",
            BottomMiddle => "bottom-middle",
            BottomBottom => "bottom-bottom",
            Width => "width-width",
            Height => "height-height",
            LeftExtLeft => "leftext-left",
            LeftExtRight => "leftext-right",
            RightExtLeft => "rightext-left",
            RightExtRight => "rightext-right",
            TopExtTop => "topext-top",
            TopExtBottom => "topext-bottom",
            BottomExtTop => "bottomext-top",
            BottomExtBottom => "bottomext-bottom",
            Size => "size-size",
        }
    }

    /// Look up a side-pair token (already normalized, no `%`).
    ///
    /// Accepts the 24 canonical tokens plus `size-size` for [`RelationType::Size`].
    pub fn from_side_pair(token: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .chain([RelationType::Size])
            .find(|kind| kind.as_side_pair() == token)
    }
}

// =============================================================================
// RelationDef
// =============================================================================

/// One registered relation of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    pub relation: RelationType,
    pub percent: bool,
    pub affect_by_self_size: bool,
}

impl RelationDef {
    /// Create a def; the self-size flag is derived from the kind.
    pub const fn new(relation: RelationType, percent: bool) -> Self {
        Self {
            relation,
            percent,
            affect_by_self_size: relation.affected_by_self_size(),
        }
    }
}
