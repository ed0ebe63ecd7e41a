//! Session glue: wires the store to a [`GeoSource`] and the durable
//! preference store, and runs the follow-up fetches each user operation
//! needs.

use crate::action::Action;
use crate::chart::{chart_data, ChartData};
use crate::events::{ChartEvent, MapEvent};
use crate::orchestrator::{ApplyOutcome, TimeSeriesOrchestrator};
use crate::reference::{ReferenceLoader, ReferenceOutcome};
use crate::resolver::resolve_for_state;
use crate::state::AppState;
use crate::store::AppStore;
use bwr_core::catalog::Catalog;
use bwr_core::point::{LatLon, PointId, PointUpdate};
use bwr_core::source::GeoSource;
use bwr_core::tile::{MapLayer, TileParams};
use bwr_prefs::{DatasetPreference, KeyValueStore, PreferenceStore};
use log::{debug, info, warn};

pub struct Session<S: GeoSource, K: KeyValueStore> {
    store: AppStore,
    source: S,
    preferences: PreferenceStore<K>,
    reference: ReferenceLoader,
    series: TimeSeriesOrchestrator,
}

impl<S: GeoSource, K: KeyValueStore> Session<S, K> {
    pub fn new(source: S, preferences: K) -> Self {
        Self {
            store: AppStore::new(AppState::new()),
            source,
            preferences: PreferenceStore::new(preferences),
            reference: ReferenceLoader::new(),
            series: TimeSeriesOrchestrator::new(),
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn preferences(&self) -> &PreferenceStore<K> {
        &self.preferences
    }

    /// Fetch and install the dataset catalog, returning its size.
    ///
    /// A failed fetch installs an empty catalog.
    pub async fn load_catalog(&self) -> usize {
        let catalog = match self.source.fetch_catalog().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("session: catalog load failed: {}", e);
                Catalog::default()
            }
        };
        let count = catalog.len();
        info!("session: catalog has {} datasets", count);
        self.store.dispatch(Action::SetCatalog(catalog));
        self.activate_current().await;
        count
    }

    /// Make `dataset_id` current. Returns false for an unknown id.
    pub async fn select_dataset(&self, dataset_id: &str) -> bool {
        if !self.store.read(|state| state.catalog.contains(dataset_id)) {
            warn!("session: unknown dataset {}", dataset_id);
            return false;
        }
        self.store
            .dispatch(Action::SetCurrentDataset(dataset_id.to_string()));
        self.activate_current().await;
        true
    }

    /// Load stored preferences and the reference series for the current
    /// dataset, then refresh the chart.
    async fn activate_current(&self) {
        let Some(dataset_id) = self.current_dataset() else {
            return;
        };
        if let Some(pref) = self.durable(&dataset_id) {
            debug!("session: applying stored preferences for {}", dataset_id);
            self.store.dispatch_all([
                Action::SetColormap(pref.colormap),
                Action::SetVmin(pref.vmin),
                Action::SetVmax(pref.vmax),
            ]);
        }
        self.reference
            .ensure(&self.store, &self.source, &dataset_id)
            .await;
        self.refresh_chart().await;
    }

    pub async fn add_point(&self, position: LatLon, name: Option<&str>) -> PointId {
        let id = PointId::generate();
        self.store.dispatch(Action::AddTimeSeriesPoint {
            id: id.clone(),
            position,
            name: name.map(str::to_string),
        });
        self.refresh_chart().await;
        id
    }

    pub async fn remove_point(&self, id: &PointId) {
        self.store
            .dispatch(Action::RemoveTimeSeriesPoint(id.clone()));
        self.refresh_chart().await;
    }

    /// Update a point; only moves and visibility changes trigger a fetch.
    pub async fn update_point(&self, id: &PointId, update: PointUpdate) {
        let refetch = update.position.is_some() || update.visible.is_some();
        self.store.dispatch(Action::UpdateTimeSeriesPoint {
            id: id.clone(),
            update,
        });
        if refetch {
            self.refresh_chart().await;
        }
    }

    /// Move the reference marker. Only the displayed dataset's reference
    /// series is refetched; the others refresh when next selected.
    pub async fn move_reference(&self, position: LatLon) -> ReferenceOutcome {
        self.store.dispatch(Action::SetRefMarkerPosition(position));
        let Some(dataset_id) = self.current_dataset() else {
            return ReferenceOutcome::NotNeeded;
        };
        let outcome = self
            .reference
            .ensure(&self.store, &self.source, &dataset_id)
            .await;
        let uses_reference = self.store.read(|state| {
            state
                .current_entry()
                .is_some_and(|entry| entry.uses_spatial_ref)
        });
        if uses_reference {
            self.refresh_chart().await;
        }
        outcome
    }

    pub fn set_time_index(&self, index: usize) {
        self.store.dispatch(Action::SetTimeIndex(index));
    }

    /// Change the colormap and store it for the current dataset.
    pub fn set_colormap(&self, colormap: &str) -> anyhow::Result<()> {
        self.store
            .dispatch(Action::SetColormap(colormap.to_string()));
        self.persist_display()
    }

    /// Change the color range and store it for the current dataset.
    pub fn set_range(&self, vmin: f64, vmax: f64) -> anyhow::Result<()> {
        self.store
            .dispatch_all([Action::SetVmin(vmin), Action::SetVmax(vmax)]);
        self.persist_display()
    }

    fn persist_display(&self) -> anyhow::Result<()> {
        let Some(dataset_id) = self.current_dataset() else {
            return Ok(());
        };
        let pref = self.store.read(|state| {
            DatasetPreference::new(&state.display.colormap, state.display.vmin, state.display.vmax)
        });
        self.preferences.set(&dataset_id, &pref)
    }

    pub async fn toggle_trends(&self) -> ApplyOutcome {
        self.store.dispatch(Action::ToggleTrends);
        self.refresh_chart().await
    }

    pub async fn handle_map_event(&self, event: MapEvent) {
        match event {
            MapEvent::ReferenceDragged(position) => {
                self.move_reference(position).await;
            }
            MapEvent::Click(position) => {
                self.add_point(position, None).await;
            }
            event @ MapEvent::PointDragged { .. } => {
                self.store.dispatch(event.into_action());
                self.refresh_chart().await;
            }
        }
    }

    pub fn handle_chart_event(&self, event: ChartEvent) {
        self.store.dispatch(event.into_action());
    }

    /// Issue one batched series request for the visible points.
    pub async fn refresh_chart(&self) -> ApplyOutcome {
        self.series.refresh(&self.store, &self.source).await
    }

    pub fn chart_data(&self) -> Option<ChartData> {
        self.store.read(chart_data)
    }

    /// Tile parameters for the current view, honouring stored preferences.
    pub fn tile_params(&self) -> Option<TileParams> {
        let dataset_id = self.current_dataset()?;
        let durable = self.durable(&dataset_id);
        self.store
            .read(|state| resolve_for_state(state, durable.as_ref()))
    }

    /// Fetch the tile manifest for the current view.
    ///
    /// Returns `None` on failure, or when the dataset, time step or resolved
    /// parameters changed while the manifest was in flight.
    pub async fn tile_layer(&self) -> Option<MapLayer> {
        let view = self.tile_view()?;
        let manifest = match self.source.fetch_tilejson(&view.2).await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("session: tile manifest for {} failed: {}", view.0, e);
                return None;
            }
        };
        if self.tile_view().as_ref() != Some(&view) {
            debug!("session: dropping stale tile manifest for {}", view.0);
            return None;
        }
        let Some(url_template) = manifest.url_template() else {
            warn!("session: tile manifest for {} has no tiles", view.0);
            return None;
        };
        Some(MapLayer {
            url_template: url_template.to_string(),
            opacity: self.store.read(|state| state.display.opacity),
        })
    }

    fn tile_view(&self) -> Option<(String, usize, TileParams)> {
        let params = self.tile_params()?;
        self.store.read(|state| {
            let entry = state.current_entry()?;
            Some((entry.id.clone(), state.clamped_time_index(), params))
        })
    }

    fn current_dataset(&self) -> Option<String> {
        self.store.read(|state| state.current_dataset.clone())
    }

    fn durable(&self, dataset_id: &str) -> Option<DatasetPreference> {
        match self.preferences.get(dataset_id) {
            Ok(pref) => pref,
            Err(e) => {
                warn!("session: reading preferences for {} failed: {}", dataset_id, e);
                None
            }
        }
    }
}
