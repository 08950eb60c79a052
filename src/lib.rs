//! Regional electricity balance and storage dispatch simulator.
//!
//! Computes the quarter-hour balance of a region's production against its
//! consumption (including a synthesized heat-pump load), dispatches an EV
//! fleet with vehicle-to-grid support against the balance, then runs the
//! residual through a fixed storage cascade of battery, pumped hydro and
//! hydrogen. All inputs and outputs are in-memory [`series::TimeSeries`]
//! values on a canonical 15-minute grid; CSV lives only at the boundary.

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
/// Time-series container and the canonical 15-minute grid.
pub mod series;
/// Simulation stages: balance, heat pumps, EV fleet, storage, pipeline.
pub mod sim;
/// Seeded synthetic input data.
pub mod synth;
