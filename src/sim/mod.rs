/// Quarter-hour balance calculation and annual reporting.
pub mod balance;
/// Aggregate EV fleet with V2G dispatch.
pub mod ev_fleet;
/// Temperature-dependent heat-pump load synthesis.
pub mod heat_pump;
pub mod pipeline;
/// Storage bucket model and dispatch cascade.
pub mod storage;
