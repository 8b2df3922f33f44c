use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::TransformError;
use crate::frame::{self, Column};

/// Game-level columns of the play-by-play feed, in output order.
pub const GAME_COLUMNS: [&str; 28] = [
    "game_id",
    "old_game_id",
    "home_team",
    "away_team",
    "season_type",
    "season",
    "week",
    "game_date",
    "start_time",
    "stadium",
    "weather",
    "nfl_api_id",
    "home_score",
    "away_score",
    "location",
    "result",
    "total",
    "spread_line",
    "total_line",
    "div_game",
    "roof",
    "surface",
    "temp",
    "wind",
    "home_coach",
    "away_coach",
    "stadium_id",
    "game_stadium",
];

const GAME_DATE_FORMAT: &str = "%Y-%m-%d";
const START_TIME_FORMAT: &str = "%m/%d/%y, %H:%M:%S";
const DAYS_FROM_CE_TO_UNIX_EPOCH: i32 = 719_163;

pub fn transform(play_by_play: &RecordBatch) -> Result<RecordBatch, TransformError> {
    let mut columns = Vec::with_capacity(GAME_COLUMNS.len());
    for name in GAME_COLUMNS {
        let column = frame::named(play_by_play, name)?;
        let column = match name {
            "game_date" => game_date_column(column)?,
            "start_time" => start_time_column(column)?,
            _ => column,
        };
        columns.push(column);
    }

    let games = frame::unique_rows(&frame::assemble(columns)?)?;
    ensure_unique_game_ids(&games)?;
    Ok(games)
}

fn game_date_column((field, array): Column) -> Result<Column, TransformError> {
    if array.data_type() == &DataType::Date32 {
        return Ok((field, array));
    }
    let text = frame::utf8(&array)?;
    let mut days = Vec::with_capacity(text.len());
    for value in text.iter() {
        let parsed = match value {
            Some(raw) => Some(parse_game_date(raw).ok_or_else(|| {
                TransformError::UnparsableDate {
                    column: field.name().to_string(),
                    value: raw.to_string(),
                }
            })?),
            None => None,
        };
        days.push(parsed);
    }
    let array: ArrayRef = Arc::new(Date32Array::from(days));
    Ok((Arc::new(Field::new(field.name(), DataType::Date32, true)), array))
}

fn start_time_column((field, array): Column) -> Result<Column, TransformError> {
    let text = frame::utf8(&array)?;
    let micros = text
        .iter()
        .map(|value| value.and_then(parse_start_time))
        .collect::<Vec<_>>();
    let array: ArrayRef = Arc::new(TimestampMicrosecondArray::from(micros));
    let field = Field::new(
        field.name(),
        DataType::Timestamp(TimeUnit::Microsecond, None),
        true,
    );
    Ok((Arc::new(field), array))
}

/// Days since the unix epoch.
pub fn parse_game_date(raw: &str) -> Option<i32> {
    let date = NaiveDate::parse_from_str(raw.trim(), GAME_DATE_FORMAT).ok()?;
    Some(date.num_days_from_ce() - DAYS_FROM_CE_TO_UNIX_EPOCH)
}

/// Microseconds since the unix epoch; `None` for anything off-format.
pub fn parse_start_time(raw: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(raw.trim(), START_TIME_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp_micros())
}

fn ensure_unique_game_ids(games: &RecordBatch) -> Result<(), TransformError> {
    let (_, ids) = frame::named(games, "game_id")?;
    let ids = frame::utf8(&ids)?;
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids.iter().flatten() {
        if !seen.insert(id) {
            return Err(TransformError::DuplicateKey {
                what: "game_id",
                key: id.to_string(),
            });
        }
    }
    Ok(())
}
