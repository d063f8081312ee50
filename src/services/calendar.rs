use crate::config::SeasonConfig;
use crate::database::Store;
use crate::engine::calendar::detect_current_gameweek;
use crate::errors::Result;

/// An explicit request wins, then the configured pin, then whatever the match
/// cache says is next up.
pub async fn resolve_current_gameweek(
    store: &dyn Store,
    season: &SeasonConfig,
    requested: Option<u32>,
) -> Result<u32> {
    if let Some(gameweek) = requested.or(season.current_gameweek) {
        return season.check_gameweek(gameweek);
    }
    let matches = store.all_matches().await?;
    Ok(detect_current_gameweek(&matches, season.total_gameweeks))
}
