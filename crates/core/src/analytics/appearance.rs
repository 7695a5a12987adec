use std::collections::BTreeMap;

use crate::annotation::annotation_store::AnnotationStore;
use crate::shared::bounding_box::TrackId;

/// Number of stored frames containing a box for `id`.
pub fn appearance_count(store: &AnnotationStore, id: TrackId) -> usize {
    store.frames_of(id).map_or(0, |frames| frames.len())
}

/// Appearance count for every identity in the store.
pub fn appearance_counts(store: &AnnotationStore) -> BTreeMap<TrackId, usize> {
    store
        .all_identities()
        .into_iter()
        .map(|id| (id, appearance_count(store, id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    fn bbox(id: TrackId) -> BoundingBox {
        BoundingBox::new(id, 0.0, 0.0, 10.0, 10.0)
    }

    fn sample_store() -> AnnotationStore {
        let mut store = AnnotationStore::new();
        store.upsert_frame(0, vec![bbox(1)]);
        store.upsert_frame(1, vec![bbox(1), bbox(2)]);
        store.upsert_frame(2, vec![bbox(2)]);
        store
    }

    #[test]
    fn test_appearance_count() {
        let store = sample_store();
        assert_eq!(appearance_count(&store, 1), 2);
        assert_eq!(appearance_count(&store, 2), 2);
        assert_eq!(appearance_count(&store, 3), 0);
    }

    #[test]
    fn test_appearance_counts_follow_frame_replacement() {
        let mut store = sample_store();
        store.upsert_frame(1, vec![bbox(2)]);
        assert_eq!(appearance_counts(&store), BTreeMap::from([(1, 1), (2, 2)]));
    }

    #[test]
    fn test_empty_store() {
        assert!(appearance_counts(&AnnotationStore::new()).is_empty());
    }
}
