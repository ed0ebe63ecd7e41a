//! Client-side state for the raster time-series viewer.
//!
//! - `state`, `action`, `reducer`, `store`: the single authoritative
//!   snapshot and the actions that mutate it
//! - `resolver`: tile request parameters from a snapshot
//! - `reference`: per-dataset reference series cache
//! - `orchestrator`: batched series fetches with stale-response rejection
//! - `chart`, `events`: payloads for and events from the chart and map
//! - `session`: ties the above to a data source and durable preferences

pub mod action;
pub mod chart;
pub mod events;
pub mod orchestrator;
pub mod reducer;
pub mod reference;
pub mod resolver;
pub mod session;
pub mod state;
pub mod store;
