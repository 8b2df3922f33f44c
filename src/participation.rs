use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringBuilder, UInt32Array};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;

use crate::error::TransformError;
use crate::frame;

const PLAYER_SEPARATOR: char = ';';

/// One row per (game, play, player). `None` when the season has no
/// participation data, in which case nothing is loaded either.
pub fn transform(participation: Option<&RecordBatch>) -> Result<Option<RecordBatch>, TransformError> {
    let Some(participation) = participation else {
        return Ok(None);
    };

    let game_id = frame::named(participation, "nflverse_game_id")?;
    let play_id = frame::named(participation, "play_id")?;
    let on_play = frame::utf8(&frame::named(participation, "players_on_play")?.1)?;
    let offense = frame::utf8(&frame::named(participation, "offense_players")?.1)?;
    let defense = frame::utf8(&frame::named(participation, "defense_players")?.1)?;

    let mut rows = Vec::new();
    let mut players = StringBuilder::new();
    for row in 0..participation.num_rows() {
        if on_play.is_null(row) || on_play.value(row).is_empty() {
            continue;
        }
        if offense.is_null(row) || defense.is_null(row) {
            // A null side nulls the whole list; the play still yields one row.
            rows.push(row as u32);
            players.append_null();
            continue;
        }
        let listed = offense
            .value(row)
            .split(PLAYER_SEPARATOR)
            .chain(defense.value(row).split(PLAYER_SEPARATOR));
        for player_id in listed {
            rows.push(row as u32);
            players.append_value(player_id);
        }
    }

    let rows = UInt32Array::from(rows);
    let player_ids: ArrayRef = Arc::new(players.finish());
    let columns = vec![
        frame::gather(&game_id, &rows, Some("game_id"))?,
        frame::gather(&play_id, &rows, None)?,
        (
            Arc::new(Field::new("player_id", DataType::Utf8, true)),
            player_ids,
        ),
    ];
    frame::assemble(columns).map(Some)
}
