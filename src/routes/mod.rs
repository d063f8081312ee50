pub mod admin;
pub mod gameweeks;
pub mod leagues;
