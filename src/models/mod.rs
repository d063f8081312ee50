pub mod gameweek;
pub mod league;
pub mod match_record;
pub mod prediction;
pub mod user;
