use std::collections::HashMap;

use arrow::array::{Array, Int64Array, StringArray, UInt32Array};
use arrow::record_batch::RecordBatch;

use crate::error::TransformError;
use crate::frame;

/// Dropped from the output; the resolved game row carries them.
const DROPPED_COLUMNS: [&str; 3] = ["season", "week", "season_type"];

type TeamWeek<'a> = (&'a str, i64, i64);

/// Resolves a `game_id` for each weekly stat line by matching the player's
/// team against the home side first and the away side second. Rows with no
/// matching game (bye weeks, gaps in the feed) keep a null `game_id`.
pub fn transform(player_stats: &RecordBatch, games: &RecordBatch) -> Result<RecordBatch, TransformError> {
    let home = frame::utf8(&frame::named(games, "home_team")?.1)?;
    let away = frame::utf8(&frame::named(games, "away_team")?.1)?;
    let game_seasons = frame::int64(&frame::named(games, "season")?.1)?;
    let game_weeks = frame::int64(&frame::named(games, "week")?.1)?;
    let by_home = index_games(&home, &game_seasons, &game_weeks, "home game (team, season, week)")?;
    let by_away = index_games(&away, &game_seasons, &game_weeks, "away game (team, season, week)")?;

    let teams = frame::utf8(&frame::named(player_stats, "recent_team")?.1)?;
    let seasons = frame::int64(&frame::named(player_stats, "season")?.1)?;
    let weeks = frame::int64(&frame::named(player_stats, "week")?.1)?;
    let resolved = (0..player_stats.num_rows())
        .map(|row| {
            let key = team_week(&teams, &seasons, &weeks, row)?;
            by_home.get(&key).or_else(|| by_away.get(&key)).copied()
        })
        .collect::<UInt32Array>();

    let game_id = frame::named(games, "game_id")?;
    let mut columns = vec![frame::gather(&game_id, &resolved, None)?];
    let schema = player_stats.schema();
    for (field, array) in schema.fields().iter().zip(player_stats.columns()) {
        let name = field.name().as_str();
        // A source game_id would shadow the resolved one.
        if name == "game_id" || DROPPED_COLUMNS.contains(&name) {
            continue;
        }
        columns.push((field.clone(), array.clone()));
    }
    frame::assemble(columns)
}

fn index_games<'a>(
    teams: &'a StringArray,
    seasons: &Int64Array,
    weeks: &Int64Array,
    what: &'static str,
) -> Result<HashMap<TeamWeek<'a>, u32>, TransformError> {
    let mut out = HashMap::with_capacity(teams.len());
    for row in 0..teams.len() {
        let Some(key) = team_week(teams, seasons, weeks, row) else {
            continue;
        };
        if out.insert(key, row as u32).is_some() {
            return Err(TransformError::DuplicateKey {
                what,
                key: format!("({}, {}, {})", key.0, key.1, key.2),
            });
        }
    }
    Ok(out)
}

fn team_week<'a>(
    teams: &'a StringArray,
    seasons: &Int64Array,
    weeks: &Int64Array,
    row: usize,
) -> Option<TeamWeek<'a>> {
    if teams.is_null(row) || seasons.is_null(row) || weeks.is_null(row) {
        return None;
    }
    Some((teams.value(row), seasons.value(row), weeks.value(row)))
}
