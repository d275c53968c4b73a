//! The per-station series stages: calendar completion, gap filling, monthly totals and
//! rolling sums. Each is a pure function from one [`crate::StationSeries`] to the next.

pub mod calendar;
pub mod error;
pub mod interpolate;
pub mod monthly;
pub mod rolling;
