use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::shared::bounding_box::{BoundingBox, FrameIndex, TrackId};

/// Two boxes sharing one tracking id were delivered for the same frame.
///
/// Not an error: the later box is kept and the conflict is reported.
#[derive(Clone, Debug, PartialEq)]
pub struct DuplicateIdentityInFrame {
    pub frame: FrameIndex,
    pub id: TrackId,
    pub discarded: BoundingBox,
}

/// Outcome of a full-frame upsert.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpsertReport {
    pub stored: usize,
    pub duplicates: Vec<DuplicateIdentityInFrame>,
}

/// Per-frame bounding boxes keyed by tracking id.
///
/// Each frame keeps its boxes in delivery order with ids unique within
/// the frame. An `id -> frames` index is maintained on every write so
/// appearance lookups do not rescan the whole store.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    frames: BTreeMap<FrameIndex, Vec<BoundingBox>>,
    appearances: HashMap<TrackId, BTreeSet<FrameIndex>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire box set for `frame`.
    ///
    /// When an id repeats, the later box overwrites the earlier one in the
    /// earlier one's slot.
    pub fn upsert_frame(&mut self, frame: FrameIndex, boxes: Vec<BoundingBox>) -> UpsertReport {
        let mut kept: Vec<BoundingBox> = Vec::with_capacity(boxes.len());
        let mut slots: HashMap<TrackId, usize> = HashMap::with_capacity(boxes.len());
        let mut duplicates = Vec::new();

        for bbox in boxes {
            match slots.get(&bbox.id).copied() {
                Some(slot) => {
                    log::warn!(
                        "Duplicate track id {} in frame {frame}; keeping the later box",
                        bbox.id
                    );
                    duplicates.push(DuplicateIdentityInFrame {
                        frame,
                        id: bbox.id,
                        discarded: kept[slot],
                    });
                    kept[slot] = bbox;
                }
                None => {
                    slots.insert(bbox.id, kept.len());
                    kept.push(bbox);
                }
            }
        }

        self.unindex_frame(frame);
        for bbox in &kept {
            self.appearances.entry(bbox.id).or_default().insert(frame);
        }
        let stored = kept.len();
        self.frames.insert(frame, kept);

        UpsertReport { stored, duplicates }
    }

    /// Operator correction: replaces the box for `(frame, bbox.id)`, or adds
    /// it when the frame has no box with that id.
    pub fn correct_box(&mut self, frame: FrameIndex, bbox: BoundingBox) {
        let boxes = self.frames.entry(frame).or_default();
        match boxes.iter_mut().find(|b| b.id == bbox.id) {
            Some(existing) => *existing = bbox,
            None => boxes.push(bbox),
        }
        self.appearances.entry(bbox.id).or_default().insert(frame);
    }

    /// Boxes for `frame`; empty for frames never observed.
    pub fn get_frame(&self, frame: FrameIndex) -> &[BoundingBox] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_frame(&self, frame: FrameIndex) -> bool {
        self.frames.contains_key(&frame)
    }

    /// Clears everything; used when a new video source is loaded.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.appearances.clear();
    }

    pub fn all_identities(&self) -> BTreeSet<TrackId> {
        self.appearances.keys().copied().collect()
    }

    /// Frames in which `id` has a box, ascending.
    pub fn frames_of(&self, id: TrackId) -> Option<&BTreeSet<FrameIndex>> {
        self.appearances.get(&id)
    }

    /// Observed frames in ascending index order.
    pub fn frames(&self) -> impl Iterator<Item = (FrameIndex, &[BoundingBox])> {
        self.frames.iter().map(|(f, boxes)| (*f, boxes.as_slice()))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// First and last observed frame indices.
    pub fn frame_range(&self) -> Option<(FrameIndex, FrameIndex)> {
        let first = *self.frames.keys().next()?;
        let last = *self.frames.keys().next_back()?;
        Some((first, last))
    }

    fn unindex_frame(&mut self, frame: FrameIndex) {
        let Some(previous) = self.frames.get(&frame) else {
            return;
        };
        for bbox in previous {
            if let Some(frames) = self.appearances.get_mut(&bbox.id) {
                frames.remove(&frame);
                if frames.is_empty() {
                    self.appearances.remove(&bbox.id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(id: TrackId, x: f64) -> BoundingBox {
        BoundingBox::new(id, x, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_unobserved_frame_is_empty() {
        let store = AnnotationStore::new();
        assert!(store.get_frame(42).is_empty());
        assert!(!store.contains_frame(42));
    }

    #[test]
    fn test_upsert_then_get() {
        let mut store = AnnotationStore::new();
        let report = store.upsert_frame(3, vec![bbox(1, 0.0), bbox(2, 5.0)]);
        assert_eq!(report.stored, 2);
        assert!(report.duplicates.is_empty());
        assert_eq!(store.get_frame(3), &[bbox(1, 0.0), bbox(2, 5.0)]);
    }

    #[test]
    fn test_duplicate_id_keeps_later_box_in_first_slot() {
        let mut store = AnnotationStore::new();
        let report = store.upsert_frame(0, vec![bbox(1, 0.0), bbox(2, 5.0), bbox(1, 99.0)]);
        assert_eq!(report.stored, 2);
        assert_eq!(
            report.duplicates,
            vec![DuplicateIdentityInFrame {
                frame: 0,
                id: 1,
                discarded: bbox(1, 0.0),
            }]
        );
        assert_eq!(store.get_frame(0), &[bbox(1, 99.0), bbox(2, 5.0)]);
    }

    #[test]
    fn test_upsert_replaces_whole_frame() {
        let mut store = AnnotationStore::new();
        store.upsert_frame(0, vec![bbox(1, 0.0), bbox(2, 0.0)]);
        store.upsert_frame(0, vec![bbox(3, 0.0)]);

        assert_eq!(store.get_frame(0), &[bbox(3, 0.0)]);
        assert!(store.frames_of(1).is_none());
        assert_eq!(store.all_identities(), BTreeSet::from([3]));
    }

    #[test]
    fn test_last_write_wins_for_same_frame() {
        let mut store = AnnotationStore::new();
        store.upsert_frame(5, vec![bbox(1, 1.0)]);
        store.upsert_frame(5, vec![bbox(1, 2.0)]);
        assert_eq!(store.get_frame(5), &[bbox(1, 2.0)]);
    }

    #[test]
    fn test_all_identities_is_union() {
        let mut store = AnnotationStore::new();
        store.upsert_frame(0, vec![bbox(1, 0.0)]);
        store.upsert_frame(1, vec![bbox(1, 0.0), bbox(2, 0.0)]);
        store.upsert_frame(7, vec![bbox(9, 0.0)]);
        assert_eq!(store.all_identities(), BTreeSet::from([1, 2, 9]));
    }

    #[test]
    fn test_frames_of_tracks_appearances() {
        let mut store = AnnotationStore::new();
        store.upsert_frame(0, vec![bbox(1, 0.0)]);
        store.upsert_frame(4, vec![bbox(1, 0.0)]);
        store.upsert_frame(2, vec![bbox(2, 0.0)]);
        let frames: Vec<_> = store.frames_of(1).unwrap().iter().copied().collect();
        assert_eq!(frames, vec![0, 4]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = AnnotationStore::new();
        store.upsert_frame(0, vec![bbox(1, 0.0)]);
        store.reset();
        assert!(store.is_empty());
        assert!(store.all_identities().is_empty());
        assert!(store.frame_range().is_none());
    }

    #[test]
    fn test_correct_box_replaces_matching_id() {
        let mut store = AnnotationStore::new();
        store.upsert_frame(0, vec![bbox(1, 0.0), bbox(2, 0.0)]);
        store.correct_box(0, bbox(2, 50.0));
        assert_eq!(store.get_frame(0), &[bbox(1, 0.0), bbox(2, 50.0)]);
    }

    #[test]
    fn test_correct_box_inserts_when_absent() {
        let mut store = AnnotationStore::new();
        store.correct_box(8, bbox(3, 1.0));
        assert_eq!(store.get_frame(8), &[bbox(3, 1.0)]);
        assert!(store.frames_of(3).unwrap().contains(&8));
    }

    #[test]
    fn test_frames_iterate_in_index_order_with_gaps() {
        let mut store = AnnotationStore::new();
        store.upsert_frame(10, vec![]);
        store.upsert_frame(2, vec![bbox(1, 0.0)]);
        store.upsert_frame(5, vec![]);
        let order: Vec<_> = store.frames().map(|(f, _)| f).collect();
        assert_eq!(order, vec![2, 5, 10]);
        assert_eq!(store.frame_range(), Some((2, 10)));
        assert_eq!(store.frame_count(), 3);
    }
}
