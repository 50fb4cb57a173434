//! Batch driver around `dispatch_core`: flat-file rosters, day-by-day
//! request traffic, and the text/CSV report renderers.

pub mod error;
pub mod report;
pub mod roster;
pub mod runner;
