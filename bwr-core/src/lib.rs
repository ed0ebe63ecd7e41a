//! Core types and API client for browsing geospatial time-series datasets.
//!
//! This crate provides:
//! - `catalog`: dataset catalog entries as served by the `/datasets` endpoint
//! - `point`: user-placed time series points, palette and id policy
//! - `trend`: server-computed linear trend fits
//! - `series`: batched multi-point request/response payloads
//! - `tile`: tile manifest request parameters and decoded tilejson
//! - `source`: the transport seam implemented by the HTTP client
//! - `api`: `reqwest` client for a Bowser server (feature `api`)

pub mod catalog;
pub mod point;
pub mod series;
pub mod source;
pub mod tile;
pub mod trend;

#[cfg(feature = "api")]
pub mod api;
