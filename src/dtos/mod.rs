pub mod gameweek_dtos;
pub mod league_dtos;
