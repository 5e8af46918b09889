use crate::{segment::Segment, types::SegmentId};
use std::collections::BTreeSet;

/// The standing forest: an append-only segment arena plus the set of
/// segments that have been detached by cuts.
///
/// Segments are never removed. A cut marks the hit segment `is_cut`,
/// truncates it in place, and adds every descendant to `cut_branches`.
#[derive(Debug, Default)]
pub struct Tree {
    pub segments: Vec<Segment>,
    cut_branches: BTreeSet<SegmentId>,
}

impl Tree {
    pub fn new(segments: Vec<Segment>) -> Self {
        debug_assert!(
            segments.iter().enumerate().all(|(i, s)| s.index == i),
            "segment indices must match arena positions"
        );
        Self {
            segments,
            cut_branches: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Indices detached by cuts, in ascending order.
    pub fn cut_branches(&self) -> &BTreeSet<SegmentId> {
        &self.cut_branches
    }

    pub fn is_detached(&self, id: SegmentId) -> bool {
        self.cut_branches.contains(&id)
    }

    /// `true` if the segment is still part of the standing tree and can be
    /// hit by a swipe.
    pub fn is_cuttable(&self, id: SegmentId) -> bool {
        !self.is_detached(id) && !self.segments[id].is_cut
    }

    /// Segments still drawn as part of the standing tree (including
    /// truncated stumps).
    pub fn standing(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| !self.cut_branches.contains(&s.index))
    }

    /// Adds ids to the cut set. Returns how many were not already present.
    pub fn detach<I: IntoIterator<Item = SegmentId>>(&mut self, ids: I) -> usize {
        let mut added = 0;
        for id in ids {
            assert!(id < self.segments.len(), "segment {id} is outside the arena");
            if self.cut_branches.insert(id) {
                added += 1;
            }
        }
        added
    }

    /// Collects `id` and every segment reachable through `children`.
    ///
    /// Iterative depth-first walk; the order is the pop order of an explicit
    /// stack, so the first element is always `id` itself.
    ///
    /// ### Panics
    /// Panics if `id` or any child index lies outside the arena.
    pub fn subtree(&self, id: SegmentId) -> Vec<SegmentId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend_from_slice(&self.segments[i].children);
        }
        out
    }

    /// Every strict descendant of `id`, subtree by subtree over its children.
    pub fn descendants(&self, id: SegmentId) -> Vec<SegmentId> {
        self.segments[id]
            .children
            .iter()
            .flat_map(|&c| self.subtree(c))
            .collect()
    }

    /// Drops every segment and clears the cut set.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.cut_branches.clear();
    }

    /// Replaces the arena with freshly generated segments.
    pub fn replace(&mut self, segments: Vec<Segment>) {
        *self = Self::new(segments);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::Vec2;

    /// Builds a tiny arena:
    ///
    /// ```text
    /// 0 ── 1 ─┬─ 2
    ///         └─ 3 ── 4
    /// ```
    pub(crate) fn sample_tree() -> Tree {
        let layout: [(Option<usize>, &[usize], Vec2, Vec2, u32); 5] = [
            (None, &[1], Vec2::new(0.0, 0.0), Vec2::new(0.0, 100.0), 0),
            (Some(0), &[2, 3], Vec2::new(0.0, 100.0), Vec2::new(0.0, 170.0), 1),
            (Some(1), &[], Vec2::new(0.0, 170.0), Vec2::new(-30.0, 210.0), 2),
            (Some(1), &[4], Vec2::new(0.0, 170.0), Vec2::new(30.0, 210.0), 2),
            (Some(3), &[], Vec2::new(30.0, 210.0), Vec2::new(50.0, 240.0), 3),
        ];
        let segments = layout
            .iter()
            .enumerate()
            .map(|(i, (parent, children, start, end, depth))| Segment {
                index: i,
                parent: *parent,
                children: children.to_vec(),
                start: *start,
                end: *end,
                angle: (*end - *start).to_angle(),
                start_thickness: 20.0 * 0.68f32.powi(*depth as i32),
                end_thickness: 20.0 * 0.68f32.powi(*depth as i32 + 1),
                depth: *depth,
                is_cut: false,
            })
            .collect();
        Tree::new(segments)
    }

    #[test]
    fn subtree_starts_with_root_and_covers_everything() {
        let tree = sample_tree();
        let mut ids = tree.subtree(0);
        assert_eq!(ids[0], 0);
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn descendants_excludes_the_segment_itself() {
        let tree = sample_tree();
        let mut ids = tree.descendants(1);
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3, 4]);
        assert!(tree.descendants(4).is_empty());
    }

    #[test]
    fn detach_is_monotonic_and_counts_new_ids() {
        let mut tree = sample_tree();
        assert_eq!(tree.detach([2, 3]), 2);
        assert_eq!(tree.detach([3, 4]), 1);
        assert!(tree.is_detached(3));
        assert!(!tree.is_cuttable(4));
        assert!(tree.is_cuttable(0));

        let standing: Vec<SegmentId> = tree.standing().map(|s| s.index).collect();
        assert_eq!(standing, vec![0, 1]);
    }

    #[test]
    fn cut_segment_is_not_cuttable_but_still_standing() {
        let mut tree = sample_tree();
        tree.segments[1].is_cut = true;
        assert!(!tree.is_cuttable(1));
        assert!(tree.standing().any(|s| s.index == 1));
    }

    #[test]
    #[should_panic]
    fn detach_out_of_bounds_panics() {
        let mut tree = sample_tree();
        tree.detach([99]);
    }

    #[test]
    fn clear_empties_arena_and_cut_set() {
        let mut tree = sample_tree();
        tree.detach([4]);
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.cut_branches().is_empty());
    }
}
