//! Reference Value Cache: lazily fetches the reference location's series per
//! dataset.
//!
//! Only datasets flagged `uses_spatial_ref` are fetched. A cache entry goes
//! `Absent -> Fetching -> Present`, or back to `Absent` when the fetch fails.
//! Moving the reference marker makes every entry stale; callers refresh the
//! displayed dataset right away and the rest when they are next selected.

use crate::action::Action;
use crate::store::AppStore;
use bwr_core::point::LatLon;
use bwr_core::series::Series;
use bwr_core::source::GeoSource;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// A reference fetch that has been issued but not applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReference {
    pub generation: u64,
    pub dataset_id: String,
    pub position: LatLon,
}

/// What became of a call to [`ReferenceLoader::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOutcome {
    /// Dataset unknown, not reference-based, or no reference marker.
    NotNeeded,
    /// A fresh series was already cached.
    Cached,
    Applied,
    /// The reference moved or a newer fetch was issued meanwhile.
    Stale,
    Failed,
}

#[derive(Default)]
pub struct ReferenceLoader {
    next_generation: Cell<u64>,
    in_flight: RefCell<HashMap<String, u64>>,
}

impl ReferenceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a fetch for `dataset_id` is outstanding.
    pub fn is_fetching(&self, dataset_id: &str) -> bool {
        self.in_flight.borrow().contains_key(dataset_id)
    }

    /// Decide whether `dataset_id` needs a fetch and, if so, register one.
    ///
    /// Calling this again before the previous fetch lands supersedes it.
    pub fn prepare(
        &self,
        store: &AppStore,
        dataset_id: &str,
    ) -> Result<PendingReference, ReferenceOutcome> {
        let position = store.read(|state| {
            let entry = state.catalog.get(dataset_id)?;
            if !entry.uses_spatial_ref {
                return None;
            }
            state.ref_marker
        });
        let Some(position) = position else {
            return Err(ReferenceOutcome::NotNeeded);
        };
        if store.read(|state| state.reference_is_fresh(dataset_id)) {
            return Err(ReferenceOutcome::Cached);
        }

        let generation = self.next_generation.get() + 1;
        self.next_generation.set(generation);
        self.in_flight
            .borrow_mut()
            .insert(dataset_id.to_string(), generation);
        debug!(
            "reference: fetch #{} for {} at {}",
            generation, dataset_id, position
        );
        Ok(PendingReference {
            generation,
            dataset_id: dataset_id.to_string(),
            position,
        })
    }

    /// Apply a fetch result if it still matches the live reference marker
    /// and no newer fetch for the dataset was issued.
    pub fn apply(
        &self,
        store: &AppStore,
        pending: PendingReference,
        result: anyhow::Result<Series>,
    ) -> ReferenceOutcome {
        {
            let mut in_flight = self.in_flight.borrow_mut();
            if in_flight.get(&pending.dataset_id) != Some(&pending.generation) {
                debug!(
                    "reference: dropping superseded fetch #{} for {}",
                    pending.generation, pending.dataset_id
                );
                return ReferenceOutcome::Stale;
            }
            in_flight.remove(&pending.dataset_id);
        }

        if store.read(|state| state.ref_marker) != Some(pending.position) {
            debug!(
                "reference: marker moved, dropping fetch #{} for {}",
                pending.generation, pending.dataset_id
            );
            return ReferenceOutcome::Stale;
        }

        let values = match result {
            Ok(values) => values,
            Err(e) => {
                warn!(
                    "reference: fetch for {} failed, tiles stay uncorrected: {}",
                    pending.dataset_id, e
                );
                return ReferenceOutcome::Failed;
            }
        };
        let expected = store.read(|state| state.catalog.get(&pending.dataset_id).map(|e| e.len()));
        if let Some(expected) = expected {
            if values.len() != expected {
                warn!(
                    "reference: series for {} has {} values, expected {}",
                    pending.dataset_id,
                    values.len(),
                    expected
                );
                return ReferenceOutcome::Failed;
            }
        }

        info!(
            "reference: cached {} values for {}",
            values.len(),
            pending.dataset_id
        );
        store.dispatch(Action::SetRefValues {
            dataset_id: pending.dataset_id,
            position: pending.position,
            values,
        });
        ReferenceOutcome::Applied
    }

    /// Make sure the reference series for `dataset_id` is cached and fresh.
    ///
    /// Safe to call repeatedly.
    pub async fn ensure<S: GeoSource>(
        &self,
        store: &AppStore,
        source: &S,
        dataset_id: &str,
    ) -> ReferenceOutcome {
        let pending = match self.prepare(store, dataset_id) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = source
            .fetch_point_series(&pending.dataset_id, pending.position)
            .await;
        self.apply(store, pending, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use bwr_core::catalog::{Catalog, DatasetEntry};
    use bwr_core::series::{MultiPointRequest, MultiPointResponse};
    use bwr_core::tile::{TileJson, TileParams};

    struct FixedSource {
        values: Option<Series>,
        calls: Cell<usize>,
    }

    impl GeoSource for FixedSource {
        async fn fetch_catalog(&self) -> anyhow::Result<Catalog> {
            anyhow::bail!("unused")
        }

        async fn fetch_point_series(&self, _: &str, _: LatLon) -> anyhow::Result<Series> {
            self.calls.set(self.calls.get() + 1);
            self.values
                .clone()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }

        async fn fetch_multi_point(&self, _: &MultiPointRequest) -> anyhow::Result<MultiPointResponse> {
            anyhow::bail!("unused")
        }

        async fn fetch_tilejson(&self, _: &TileParams) -> anyhow::Result<TileJson> {
            anyhow::bail!("unused")
        }
    }

    fn store() -> AppStore {
        let mut a = DatasetEntry::new("A", vec!["t0".into(), "t1".into(), "t2".into()]);
        a.uses_spatial_ref = true;
        a.algorithm = Some("shift".to_string());
        let b = DatasetEntry::new("B", vec!["t0".into(), "t1".into(), "t2".into()]);
        let store = AppStore::new(AppState::new());
        store.dispatch_all([
            Action::SetCatalog([a, b].into_iter().collect()),
            Action::SetRefMarkerPosition(LatLon::new(35.0, -119.0)),
        ]);
        store
    }

    fn source(values: Option<Series>) -> FixedSource {
        FixedSource {
            values,
            calls: Cell::new(0),
        }
    }

    #[tokio::test]
    async fn test_fetches_once_then_cached() {
        let store = store();
        let loader = ReferenceLoader::new();
        let source = source(Some(vec![Some(1.0), Some(2.0), Some(3.0)]));

        assert_eq!(loader.ensure(&store, &source, "A").await, ReferenceOutcome::Applied);
        assert_eq!(loader.ensure(&store, &source, "A").await, ReferenceOutcome::Cached);
        assert_eq!(source.calls.get(), 1);
        assert_eq!(
            store.read(|s| s.reference_series("A").cloned()),
            Some(vec![Some(1.0), Some(2.0), Some(3.0)])
        );
    }

    #[tokio::test]
    async fn test_dataset_without_reference_is_skipped() {
        let store = store();
        let loader = ReferenceLoader::new();
        let source = source(Some(vec![Some(1.0)]));
        assert_eq!(loader.ensure(&store, &source, "B").await, ReferenceOutcome::NotNeeded);
        assert_eq!(loader.ensure(&store, &source, "nope").await, ReferenceOutcome::NotNeeded);
        assert_eq!(source.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_absent() {
        let store = store();
        let loader = ReferenceLoader::new();
        assert_eq!(loader.ensure(&store, &source(None), "A").await, ReferenceOutcome::Failed);
        assert!(store.read(|s| s.reference_series("A").is_none()));
        assert!(!loader.is_fetching("A"));

        // wrong length is treated like a failed fetch
        let short = source(Some(vec![Some(1.0)]));
        assert_eq!(loader.ensure(&store, &short, "A").await, ReferenceOutcome::Failed);
        assert!(store.read(|s| s.reference_series("A").is_none()));
    }

    #[test]
    fn test_marker_move_discards_in_flight_result() {
        let store = store();
        let loader = ReferenceLoader::new();
        let pending = loader.prepare(&store, "A").unwrap();
        assert!(loader.is_fetching("A"));

        store.dispatch(Action::SetRefMarkerPosition(LatLon::new(36.0, -118.5)));
        let outcome = loader.apply(&store, pending, Ok(vec![Some(1.0), Some(2.0), Some(3.0)]));
        assert_eq!(outcome, ReferenceOutcome::Stale);
        assert!(store.read(|s| s.reference_series("A").is_none()));
    }

    #[test]
    fn test_newer_fetch_supersedes_older() {
        let store = store();
        let loader = ReferenceLoader::new();
        let first = loader.prepare(&store, "A").unwrap();
        let second = loader.prepare(&store, "A").unwrap();

        let newer = vec![Some(4.0), Some(5.0), Some(6.0)];
        assert_eq!(
            loader.apply(&store, second, Ok(newer.clone())),
            ReferenceOutcome::Applied
        );
        let after_second = store.snapshot();
        assert_eq!(
            loader.apply(&store, first, Ok(vec![Some(1.0), Some(2.0), Some(3.0)])),
            ReferenceOutcome::Stale
        );
        assert_eq!(store.snapshot(), after_second);
        assert_eq!(store.read(|s| s.reference_series("A").cloned()), Some(newer));
    }

    #[tokio::test]
    async fn test_moved_marker_refetches() {
        let store = store();
        let loader = ReferenceLoader::new();
        let source = source(Some(vec![Some(1.0), Some(2.0), Some(3.0)]));
        loader.ensure(&store, &source, "A").await;

        store.dispatch(Action::SetRefMarkerPosition(LatLon::new(36.0, -118.5)));
        assert_eq!(loader.ensure(&store, &source, "A").await, ReferenceOutcome::Applied);
        assert_eq!(source.calls.get(), 2);
        assert!(store.read(|s| s.reference_is_fresh("A")));
    }
}
