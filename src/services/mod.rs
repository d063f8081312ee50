pub mod calendar;
pub mod finalization;
pub mod ingest;
pub mod leagues;
pub mod predictions;
pub mod scoreboard;
pub mod snapshot;
