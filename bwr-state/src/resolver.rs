//! Tile Parameter Resolver: pure mapping from UI state to tile request
//! parameters.
//!
//! The resolver never touches the network. For `shift` datasets that use a
//! spatial reference, the reference series value at the selected time step
//! is subtracted from the raster. When that value is not available yet the
//! tile is requested uncorrected instead of failing.

use crate::state::{AppState, DisplayPreferences};
use bwr_core::catalog::DatasetEntry;
use bwr_core::series::Series;
use bwr_core::tile::{TileParams, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use bwr_prefs::DatasetPreference;

/// Resolve tile parameters for one dataset and time step.
///
/// `durable` wins over `display` for colormap and range when it is set.
pub fn resolve_tile_params(
    entry: &DatasetEntry,
    time_index: usize,
    display: &DisplayPreferences,
    durable: Option<&DatasetPreference>,
    reference: Option<&Series>,
) -> TileParams {
    let index = entry.clamp_time_index(time_index);
    let (colormap_name, rescale) = match durable {
        Some(pref) => (pref.colormap.clone(), (pref.vmin, pref.vmax)),
        None => (display.colormap.clone(), (display.vmin, display.vmax)),
    };

    let shift = reference_shift(entry, index, reference);
    // shift without a value would fail server side
    let algorithm = if entry.uses_shift() && shift.is_none() {
        None
    } else {
        entry.algorithm.clone()
    };
    let mask = entry.mask_for(index).map(str::to_string);

    TileParams {
        url: entry.file_for(index).map(str::to_string),
        mask_min_value: mask.as_ref().and(entry.mask_min_value),
        mask,
        minzoom: DEFAULT_MIN_ZOOM,
        maxzoom: DEFAULT_MAX_ZOOM,
        colormap_name,
        rescale,
        algorithm,
        shift,
        nodata: entry.nodata,
    }
}

/// Shift term for a time step, if the dataset takes one and it is known.
pub fn reference_shift(
    entry: &DatasetEntry,
    time_index: usize,
    reference: Option<&Series>,
) -> Option<f64> {
    if !(entry.uses_spatial_ref && entry.uses_shift()) {
        return None;
    }
    reference
        .and_then(|series| series.get(time_index).copied().flatten())
        .filter(|value| value.is_finite())
}

/// Resolve tile parameters for the current dataset of a snapshot.
///
/// A reference series fetched for an earlier marker position is ignored,
/// so tiles render uncorrected until the refetch lands.
pub fn resolve_for_state(
    state: &AppState,
    durable: Option<&DatasetPreference>,
) -> Option<TileParams> {
    let entry = state.current_entry()?;
    Some(resolve_tile_params(
        entry,
        state.time_index,
        &state.display,
        durable,
        state.fresh_reference_series(&entry.id),
    ))
}
