//! Pure scoring and standings logic. Nothing in here touches storage; callers
//! load a snapshot and decide when to re-run.

pub mod aggregator;
pub mod calendar;
pub mod classic;
pub mod finalization;
pub mod h2h;
pub mod outcome;
pub mod schedule;
pub mod scorer;
