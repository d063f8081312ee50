pub(crate) mod admin;
pub(crate) mod gameweeks;
pub(crate) mod leagues;
