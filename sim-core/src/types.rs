/// Identifier for a segment in a [`crate::tree::Tree`].
///
/// This is an index into `Tree::segments`, and is only meaningful within
/// the lifetime of a given `Tree` instance.
pub type SegmentId = usize;

/// Identifier for a [`crate::piece::FallingPiece`].
///
/// Ids are handed out by [`crate::piece_set::PieceSet`] in increasing order
/// and are never reused, even after a piece has faded out.
pub type PieceId = u64;
