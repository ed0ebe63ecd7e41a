//! `prefs get|set`: direct access to stored per-dataset preferences.

use bwr_prefs::{DatasetPreference, PreferenceStore, SqliteStore};
use log::info;

pub fn run_get(path: &str, dataset: &str) -> anyhow::Result<()> {
    match load(path, dataset)? {
        Some(pref) => println!("{} {} {}", pref.colormap, pref.vmin, pref.vmax),
        None => println!("unset"),
    }
    Ok(())
}

pub fn run_set(path: &str, dataset: &str, colormap: &str, vmin: f64, vmax: f64) -> anyhow::Result<()> {
    if !(vmin.is_finite() && vmax.is_finite()) {
        anyhow::bail!("--vmin and --vmax must be finite numbers");
    }
    let store = PreferenceStore::new(SqliteStore::open(path)?);
    store.set(dataset, &DatasetPreference::new(colormap, vmin, vmax))?;
    info!("stored {} [{}, {}] for {}", colormap, vmin, vmax, dataset);
    Ok(())
}

pub fn load(path: &str, dataset: &str) -> anyhow::Result<Option<DatasetPreference>> {
    PreferenceStore::new(SqliteStore::open(path)?).get(dataset)
}
