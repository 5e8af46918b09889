use crate::{
    piece::{FallingPiece, PieceInit},
    types::PieceId,
};

/// The ordered collection of live falling pieces.
///
/// Ids are handed out monotonically and never reused, so an id held by an
/// effect layer can at worst refer to a piece that is already gone.
#[derive(Debug, Default)]
pub struct PieceSet {
    pieces: Vec<FallingPiece>,
    next_id: PieceId,
}

impl PieceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a piece at the end of the list and returns its id.
    pub fn spawn(&mut self, init: PieceInit) -> PieceId {
        let id = self.next_id;
        self.next_id += 1;
        self.pieces.push(FallingPiece::new(id, init));
        id
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FallingPiece> {
        self.pieces.iter()
    }

    pub fn as_slice(&self) -> &[FallingPiece] {
        &self.pieces
    }

    pub fn get(&self, id: PieceId) -> Option<&FallingPiece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PieceId) -> Option<&mut FallingPiece> {
        self.pieces.iter_mut().find(|p| p.id == id)
    }

    /// Keeps the pieces for which `f` returns `true`, preserving order.
    pub fn retain_mut<F: FnMut(&mut FallingPiece) -> bool>(&mut self, f: F) {
        self.pieces.retain_mut(f);
    }

    /// Drops every piece. Ids keep counting up.
    pub fn clear(&mut self) {
        self.pieces.clear();
    }
}

impl<'a> IntoIterator for &'a PieceSet {
    type Item = &'a FallingPiece;
    type IntoIter = std::slice::Iter<'a, FallingPiece>;

    fn into_iter(self) -> Self::IntoIter {
        self.pieces.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn init(x: f32) -> PieceInit {
        PieceInit {
            position: Vec2::new(x, 0.0),
            velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            segments: Vec::new(),
            thickness: 1.0,
            leaves: Vec::new(),
        }
    }

    #[test]
    fn ids_are_monotonic_and_survive_clear() {
        let mut set = PieceSet::new();
        let a = set.spawn(init(0.0));
        let b = set.spawn(init(1.0));
        assert!(b > a);
        assert_eq!(set.len(), 2);

        set.clear();
        assert!(set.is_empty());
        let c = set.spawn(init(2.0));
        assert!(c > b);
    }

    #[test]
    fn lookup_and_retain_keep_order() {
        let mut set = PieceSet::new();
        let ids: Vec<PieceId> = (0..4).map(|i| set.spawn(init(i as f32))).collect();

        set.retain_mut(|p| p.id != ids[1]);
        let remaining: Vec<PieceId> = set.iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);

        assert!(set.get(ids[1]).is_none());
        if let Some(p) = set.get_mut(ids[2]) {
            p.alpha = 0.5;
        }
        assert_eq!(set.get(ids[2]).map(|p| p.alpha), Some(0.5));
    }
}
