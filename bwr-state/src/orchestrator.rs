//! Time-Series Orchestrator: one batched series fetch for every visible
//! point, distributed back into the store.
//!
//! Responses can arrive out of order. Each request captures a generation
//! number and the intent it was issued for (dataset, point set, reference
//! position, trend flag). At apply time the response is dropped unless it is
//! the latest generation and the live state still has the same intent.
//! Accepted responses are validated as a whole before any action is
//! dispatched, and then applied in one batch, so a bad response never
//! partially overwrites good state.

use crate::action::Action;
use crate::state::AppState;
use crate::store::AppStore;
use bwr_core::point::{LatLon, PointId};
use bwr_core::series::{MultiPointRequest, MultiPointResponse, PointQuery};
use bwr_core::source::GeoSource;
use log::{debug, info, warn};
use std::cell::Cell;
use std::collections::HashSet;

/// What a batched request was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesIntent {
    pub dataset_id: String,
    pub points: Vec<(PointId, LatLon)>,
    pub reference: Option<LatLon>,
    pub calculate_trends: bool,
}

impl SeriesIntent {
    /// Intent implied by a snapshot, or `None` if there is nothing to fetch.
    pub fn from_state(state: &AppState) -> Option<Self> {
        let entry = state.current_entry()?;
        let points: Vec<(PointId, LatLon)> = state
            .visible_points()
            .map(|p| (p.id.clone(), p.position))
            .collect();
        if points.is_empty() {
            return None;
        }
        let reference = if entry.uses_spatial_ref {
            state.ref_marker
        } else {
            None
        };
        Some(Self {
            dataset_id: entry.id.clone(),
            points,
            reference,
            calculate_trends: state.show_trends,
        })
    }
}

/// A batched request that has been issued but not applied.
#[derive(Debug, Clone)]
pub struct PendingSeries {
    pub generation: u64,
    pub intent: SeriesIntent,
    pub request: MultiPointRequest,
}

/// What became of a batched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No current dataset or no visible points.
    Idle,
    Applied { points: usize },
    /// Superseded by a newer request or by a change in intent.
    Stale,
    /// Transport, decode or validation failure; state left as it was.
    Failed,
}

#[derive(Default)]
pub struct TimeSeriesOrchestrator {
    latest: Cell<u64>,
}

impl TimeSeriesOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recently issued request.
    pub fn latest_generation(&self) -> u64 {
        self.latest.get()
    }

    /// Capture the live intent and build its request.
    ///
    /// Always advances the generation, so anything still in flight becomes
    /// stale even when there is nothing new to fetch.
    pub fn prepare(&self, store: &AppStore) -> Option<PendingSeries> {
        let generation = self.latest.get() + 1;
        self.latest.set(generation);

        store.read(|state| {
            let intent = SeriesIntent::from_state(state)?;
            let points = state
                .visible_points()
                .map(|p| PointQuery {
                    id: p.id.clone(),
                    lat: p.position.lat,
                    lon: p.position.lon,
                    name: p.name.clone(),
                    color: p.color.clone(),
                })
                .collect();
            let request = MultiPointRequest {
                points,
                dataset_name: intent.dataset_id.clone(),
                ref_lon: intent.reference.map(|r| r.lon),
                ref_lat: intent.reference.map(|r| r.lat),
                calculate_trends: intent.calculate_trends,
            };
            info!(
                "series: request #{} for {} with {} points",
                generation,
                intent.dataset_id,
                intent.points.len()
            );
            Some(PendingSeries {
                generation,
                intent,
                request,
            })
        })
    }

    /// True if `pending` no longer matches what the state asks for.
    pub fn is_stale(&self, store: &AppStore, pending: &PendingSeries) -> bool {
        if pending.generation != self.latest.get() {
            return true;
        }
        store.read(|state| SeriesIntent::from_state(state).as_ref() != Some(&pending.intent))
    }

    /// Apply a response, or discard it if stale or invalid.
    pub fn apply(
        &self,
        store: &AppStore,
        pending: PendingSeries,
        result: anyhow::Result<MultiPointResponse>,
    ) -> ApplyOutcome {
        if self.is_stale(store, &pending) {
            debug!(
                "series: dropping stale response #{} (latest #{})",
                pending.generation,
                self.latest.get()
            );
            return ApplyOutcome::Stale;
        }
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("series: request #{} failed: {}", pending.generation, e);
                return ApplyOutcome::Failed;
            }
        };
        let expected_len =
            store.read(|state| state.catalog.get(&pending.intent.dataset_id).map(|e| e.len()));
        match validate(&pending.intent, &response, expected_len) {
            Ok(actions) => {
                let points = pending.intent.points.len();
                store.dispatch_all(actions);
                info!(
                    "series: applied #{} to {} points",
                    pending.generation, points
                );
                ApplyOutcome::Applied { points }
            }
            Err(e) => {
                warn!(
                    "series: rejecting response #{}: {}",
                    pending.generation, e
                );
                ApplyOutcome::Failed
            }
        }
    }

    /// Issue a request for the live intent and apply its response.
    pub async fn refresh<S: GeoSource>(&self, store: &AppStore, source: &S) -> ApplyOutcome {
        let Some(pending) = self.prepare(store) else {
            return ApplyOutcome::Idle;
        };
        let result = source.fetch_multi_point(&pending.request).await;
        self.apply(store, pending, result)
    }
}

/// Check the response against the intent and turn it into actions.
fn validate(
    intent: &SeriesIntent,
    response: &MultiPointResponse,
    expected_len: Option<usize>,
) -> anyhow::Result<Vec<Action>> {
    if let Some(expected) = expected_len {
        if response.labels.len() != expected {
            anyhow::bail!(
                "{} labels, dataset {} has {}",
                response.labels.len(),
                intent.dataset_id,
                expected
            );
        }
    }

    let requested: HashSet<&PointId> = intent.points.iter().map(|(id, _)| id).collect();
    let mut seen: HashSet<&PointId> = HashSet::new();
    let mut actions = Vec::with_capacity(response.datasets.len() * 2 + 1);
    actions.push(Action::SetSeriesLabels {
        dataset_id: intent.dataset_id.clone(),
        labels: response.labels.clone(),
    });

    for entry in &response.datasets {
        if !requested.contains(&entry.point_id) {
            anyhow::bail!("unrequested point {}", entry.point_id);
        }
        if !seen.insert(&entry.point_id) {
            anyhow::bail!("point {} returned twice", entry.point_id);
        }
        if entry.data.len() != response.labels.len() {
            anyhow::bail!(
                "point {} has {} values for {} labels",
                entry.point_id,
                entry.data.len(),
                response.labels.len()
            );
        }
        actions.push(Action::SetPointData {
            id: entry.point_id.clone(),
            dataset_id: intent.dataset_id.clone(),
            series: entry.data.clone(),
        });
        if intent.calculate_trends {
            if let Some(trend) = entry.trend {
                if !trend.is_valid() {
                    anyhow::bail!("point {} has an invalid trend fit", entry.point_id);
                }
                actions.push(Action::SetPointTrendData {
                    id: entry.point_id.clone(),
                    dataset_id: intent.dataset_id.clone(),
                    trend,
                });
            }
        }
    }

    if seen.len() != requested.len() {
        anyhow::bail!(
            "{} of {} points missing from response",
            requested.len() - seen.len(),
            requested.len()
        );
    }
    Ok(actions)
}
