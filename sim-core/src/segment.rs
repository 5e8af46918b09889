//! Tapered line elements and the [`Cuttable`] view shared by the standing
//! tree and falling pieces.

use crate::{
    geometry::{distance_to_segment, tapered_quad},
    types::SegmentId,
};
use glam::Vec2;

/// Anything a swipe can cut: a tapered segment in some coordinate frame.
///
/// Standing-tree segments live in world space; piece sub-segments live in
/// their piece's local frame. Cut detection only needs the endpoints, the
/// taper, and whether the element is still eligible.
pub trait Cuttable {
    fn start(&self) -> Vec2;
    fn end(&self) -> Vec2;
    fn start_thickness(&self) -> f32;
    fn end_thickness(&self) -> f32;
    fn depth(&self) -> u32;

    /// `true` once the element can no longer be cut (already cut, or shed).
    fn is_excluded(&self) -> bool;

    fn length(&self) -> f32 {
        self.start().distance(self.end())
    }

    /// Linear thickness interpolation at parameter `u` along the element.
    fn thickness_at(&self, u: f32) -> f32 {
        self.start_thickness() + (self.end_thickness() - self.start_thickness()) * u
    }

    /// Point at parameter `u` along the element.
    fn point_at(&self, u: f32) -> Vec2 {
        self.start().lerp(self.end(), u)
    }

    /// Distance from `p` to the element's center line.
    fn distance_to(&self, p: Vec2) -> f32 {
        distance_to_segment(p, self.start(), self.end())
    }

    /// Heading of the element in its own frame.
    fn angle(&self) -> f32 {
        let d = self.end() - self.start();
        d.y.atan2(d.x)
    }

    /// The tapered four-corner outline, see [`tapered_quad`].
    fn quad(&self) -> [Vec2; 4] {
        tapered_quad(
            self.start(),
            self.end(),
            self.start_thickness(),
            self.end_thickness(),
        )
    }
}

/// One edge of the standing tree, in world space.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub index: SegmentId,
    pub parent: Option<SegmentId>,
    pub children: Vec<SegmentId>,
    pub start: Vec2,
    pub end: Vec2,
    /// Heading the generator grew this segment along (radians).
    pub angle: f32,
    pub start_thickness: f32,
    pub end_thickness: f32,
    pub depth: u32,
    /// Set once a cut truncates this segment; never cleared.
    pub is_cut: bool,
}

impl Segment {
    /// Quad for a segment that has only grown a fraction of its length.
    ///
    /// The end thickness is interpolated with the length so a half-grown
    /// segment tapers to the thickness it has at its midpoint.
    ///
    /// ### Returns
    /// `None` when `growth <= 0` (nothing visible yet).
    pub fn partial_quad(&self, growth: f32) -> Option<[Vec2; 4]> {
        if growth <= 0.0 {
            return None;
        }
        let g = growth.min(1.0);
        Some(tapered_quad(
            self.start,
            self.point_at(g),
            self.start_thickness,
            self.thickness_at(g),
        ))
    }
}

impl Cuttable for Segment {
    fn start(&self) -> Vec2 {
        self.start
    }
    fn end(&self) -> Vec2 {
        self.end
    }
    fn start_thickness(&self) -> f32 {
        self.start_thickness
    }
    fn end_thickness(&self) -> f32 {
        self.end_thickness
    }
    fn depth(&self) -> u32 {
        self.depth
    }
    fn is_excluded(&self) -> bool {
        self.is_cut
    }
}

/// A sub-segment of a falling piece, in the piece's local frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub start_thickness: f32,
    pub end_thickness: f32,
    pub depth: u32,
    /// Whether the segment this came from still had children when it was
    /// detached. Renderers use it to cap bare tips.
    pub has_children: bool,
    /// Set once this sub-segment has been carried off into another piece.
    pub fallen: bool,
}

impl PieceSegment {
    /// Copies a tree segment into a frame whose origin sits at `origin`.
    pub fn from_segment(seg: &Segment, origin: Vec2) -> Self {
        Self {
            start: seg.start - origin,
            end: seg.end - origin,
            start_thickness: seg.start_thickness,
            end_thickness: seg.end_thickness,
            depth: seg.depth,
            has_children: !seg.children.is_empty(),
            fallen: false,
        }
    }

    /// Copy of this sub-segment shifted so that `origin` becomes `(0, 0)`.
    pub fn translated(&self, origin: Vec2) -> Self {
        Self {
            start: self.start - origin,
            end: self.end - origin,
            fallen: false,
            ..self.clone()
        }
    }

    /// Approximate mass: length times mean thickness.
    pub fn mass(&self) -> f32 {
        self.length() * (self.start_thickness + self.end_thickness) * 0.5
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }
}

impl Cuttable for PieceSegment {
    fn start(&self) -> Vec2 {
        self.start
    }
    fn end(&self) -> Vec2 {
        self.end
    }
    fn start_thickness(&self) -> f32 {
        self.start_thickness
    }
    fn end_thickness(&self) -> f32 {
        self.end_thickness
    }
    fn depth(&self) -> u32 {
        self.depth
    }
    fn is_excluded(&self) -> bool {
        self.fallen
    }
}
