use std::collections::{HashMap, HashSet};

use arrow::array::{Array, UInt32Array};
use arrow::record_batch::RecordBatch;

use crate::error::TransformError;
use crate::frame;
use crate::games::GAME_COLUMNS;

/// Personnel columns joined onto each play for modern seasons.
pub const PARTICIPATION_COLUMNS: [&str; 7] = [
    "offense_formation",
    "offense_personnel",
    "defenders_in_box",
    "defense_personnel",
    "number_of_pass_rushers",
    "n_offense",
    "n_defense",
];

const JOIN_SUFFIX: &str = "_right";

/// `participation` is `Some` only for seasons that publish it.
pub fn transform(
    play_by_play: &RecordBatch,
    participation: Option<&RecordBatch>,
) -> Result<RecordBatch, TransformError> {
    let plays = project_plays(play_by_play)?;
    match participation {
        Some(participation) => join_participation(&plays, participation),
        None => Ok(plays),
    }
}

fn project_plays(play_by_play: &RecordBatch) -> Result<RecordBatch, TransformError> {
    let mut columns = vec![
        frame::named(play_by_play, "game_id")?,
        frame::named(play_by_play, "time_of_day")?,
    ];
    let schema = play_by_play.schema();
    for (field, array) in schema.fields().iter().zip(play_by_play.columns()) {
        let name = field.name().as_str();
        if name == "time_of_day" || GAME_COLUMNS.contains(&name) {
            continue;
        }
        columns.push((field.clone(), array.clone()));
    }
    frame::assemble(columns)
}

fn join_participation(
    plays: &RecordBatch,
    participation: &RecordBatch,
) -> Result<RecordBatch, TransformError> {
    let (_, right_games) = frame::named(participation, "nflverse_game_id")?;
    let (_, right_plays) = frame::named(participation, "play_id")?;
    let right_games = frame::utf8(&right_games)?;
    let right_plays = frame::float64(&right_plays)?;
    let right_columns = PARTICIPATION_COLUMNS
        .iter()
        .map(|name| frame::named(participation, name))
        .collect::<Result<Vec<_>, _>>()?;

    // Null keys never match, same as an ordinary equi-join.
    let mut lookup = HashMap::with_capacity(participation.num_rows());
    for row in 0..participation.num_rows() {
        if right_games.is_null(row) || right_plays.is_null(row) {
            continue;
        }
        let game_id = right_games.value(row);
        let play_id = right_plays.value(row);
        if lookup
            .insert((game_id, frame::float_key(play_id)), row as u32)
            .is_some()
        {
            return Err(TransformError::DuplicateKey {
                what: "participation (game_id, play_id)",
                key: format!("({game_id}, {play_id})"),
            });
        }
    }

    let (_, left_games) = frame::named(plays, "game_id")?;
    let (_, left_plays) = frame::named(plays, "play_id")?;
    let left_games = frame::utf8(&left_games)?;
    let left_plays = frame::float64(&left_plays)?;
    let indices = (0..plays.num_rows())
        .map(|row| {
            if left_games.is_null(row) || left_plays.is_null(row) {
                return None;
            }
            let key = (left_games.value(row), frame::float_key(left_plays.value(row)));
            lookup.get(&key).copied()
        })
        .collect::<UInt32Array>();

    let schema = plays.schema();
    let taken = schema
        .fields()
        .iter()
        .map(|field| field.name().as_str())
        .collect::<HashSet<_>>();
    let mut columns = schema
        .fields()
        .iter()
        .cloned()
        .zip(plays.columns().iter().cloned())
        .collect::<Vec<_>>();
    for column in &right_columns {
        let name = column.0.name();
        let rename = taken
            .contains(name.as_str())
            .then(|| format!("{name}{JOIN_SUFFIX}"));
        columns.push(frame::gather(column, &indices, rename.as_deref())?);
    }
    frame::assemble(columns)
}
