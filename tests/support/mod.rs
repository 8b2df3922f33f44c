#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::record_batch::RecordBatch;

use nflverse_etl::error::{FetchError, WriteError};
use nflverse_etl::sink::{self, SinkWriter, WriteReceipt};
use nflverse_etl::source_fetch::{Dataset, SourceFetcher};

pub struct Play<'a> {
    pub game_id: &'a str,
    pub play_id: f64,
    pub home: &'a str,
    pub away: &'a str,
    pub week: i32,
    pub game_date: &'a str,
    pub start_time: &'a str,
    pub desc: &'a str,
}

impl<'a> Play<'a> {
    pub fn new(game_id: &'a str, play_id: f64, home: &'a str, away: &'a str, week: i32) -> Self {
        Self {
            game_id,
            play_id,
            home,
            away,
            week,
            game_date: "2020-09-13",
            start_time: "9/13/20, 16:25:00",
            desc: "pass short right",
        }
    }
}

fn strings<'a>(values: impl IntoIterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from(values.into_iter().collect::<Vec<_>>()))
}

fn owned(values: Vec<String>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

fn ints(values: impl IntoIterator<Item = i32>) -> ArrayRef {
    Arc::new(Int32Array::from(values.into_iter().collect::<Vec<_>>()))
}

fn floats(values: impl IntoIterator<Item = f64>) -> ArrayRef {
    Arc::new(Float64Array::from(values.into_iter().collect::<Vec<_>>()))
}

/// A play-by-play batch carrying every game column plus a few play fields.
/// Game metadata is derived from the teams so plays of one game agree.
pub fn play_by_play(season: i32, plays: &[Play<'_>]) -> RecordBatch {
    let n = plays.len();
    let per_game = |f: &dyn Fn(&Play<'_>) -> String| owned(plays.iter().map(f).collect());
    RecordBatch::try_from_iter(vec![
        ("play_id", floats(plays.iter().map(|p| p.play_id))),
        ("game_id", strings(plays.iter().map(|p| p.game_id))),
        ("old_game_id", per_game(&|p| format!("old_{}", p.game_id))),
        ("home_team", strings(plays.iter().map(|p| p.home))),
        ("away_team", strings(plays.iter().map(|p| p.away))),
        ("season_type", strings(std::iter::repeat_n("REG", n))),
        ("week", ints(plays.iter().map(|p| p.week))),
        ("desc", strings(plays.iter().map(|p| p.desc))),
        ("yards_gained", floats(std::iter::repeat_n(7.0, n))),
        ("game_date", strings(plays.iter().map(|p| p.game_date))),
        ("start_time", strings(plays.iter().map(|p| p.start_time))),
        ("time_of_day", strings(std::iter::repeat_n("20:30:00", n))),
        ("stadium", per_game(&|p| format!("{} Stadium", p.home))),
        ("weather", strings(std::iter::repeat_n("Sunny", n))),
        ("nfl_api_id", per_game(&|p| format!("api-{}", p.game_id))),
        ("home_score", ints(std::iter::repeat_n(24, n))),
        ("away_score", ints(std::iter::repeat_n(20, n))),
        ("location", strings(std::iter::repeat_n("Home", n))),
        ("result", ints(std::iter::repeat_n(4, n))),
        ("total", ints(std::iter::repeat_n(44, n))),
        ("spread_line", floats(std::iter::repeat_n(6.5, n))),
        ("total_line", floats(std::iter::repeat_n(48.5, n))),
        ("div_game", ints(std::iter::repeat_n(1, n))),
        ("roof", strings(std::iter::repeat_n("outdoors", n))),
        ("surface", strings(std::iter::repeat_n("grass", n))),
        ("temp", ints(std::iter::repeat_n(72, n))),
        ("wind", ints(std::iter::repeat_n(5, n))),
        ("home_coach", per_game(&|p| format!("{} Coach", p.home))),
        ("away_coach", per_game(&|p| format!("{} Coach", p.away))),
        ("stadium_id", per_game(&|p| format!("{}00", p.home))),
        ("game_stadium", per_game(&|p| format!("{} Stadium", p.home))),
        ("season", ints(std::iter::repeat_n(season, n))),
    ])
    .expect("valid play-by-play batch")
}

pub struct Snap<'a> {
    pub game_id: &'a str,
    pub play_id: i32,
    pub players_on_play: &'a str,
    pub offense_players: Option<&'a str>,
    pub defense_players: Option<&'a str>,
    pub offense_formation: Option<&'a str>,
}

impl<'a> Snap<'a> {
    pub fn new(game_id: &'a str, play_id: i32, offense: &'a str, defense: &'a str) -> Self {
        Self {
            game_id,
            play_id,
            players_on_play: "listed",
            offense_players: Some(offense),
            defense_players: Some(defense),
            offense_formation: Some("SHOTGUN"),
        }
    }
}

/// Participation rows; `play_id` is integral here as in the published files.
pub fn participation(snaps: &[Snap<'_>]) -> RecordBatch {
    let n = snaps.len();
    RecordBatch::try_from_iter(vec![
        ("nflverse_game_id", strings(snaps.iter().map(|s| s.game_id))),
        ("old_game_id", strings(std::iter::repeat_n("0", n))),
        ("play_id", ints(snaps.iter().map(|s| s.play_id))),
        ("possession_team", strings(std::iter::repeat_n("SF", n))),
        (
            "offense_formation",
            Arc::new(StringArray::from(
                snaps.iter().map(|s| s.offense_formation).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        ("offense_personnel", strings(std::iter::repeat_n("1 RB, 1 TE, 3 WR", n))),
        ("defenders_in_box", ints(std::iter::repeat_n(6, n))),
        ("defense_personnel", strings(std::iter::repeat_n("4 DL, 2 LB, 5 DB", n))),
        ("number_of_pass_rushers", ints(std::iter::repeat_n(4, n))),
        ("players_on_play", strings(snaps.iter().map(|s| s.players_on_play))),
        (
            "offense_players",
            Arc::new(StringArray::from(
                snaps.iter().map(|s| s.offense_players).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        (
            "defense_players",
            Arc::new(StringArray::from(
                snaps.iter().map(|s| s.defense_players).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        ("n_offense", ints(std::iter::repeat_n(11, n))),
        ("n_defense", ints(std::iter::repeat_n(11, n))),
    ])
    .expect("valid participation batch")
}

pub struct StatLine<'a> {
    pub player_id: &'a str,
    pub team: &'a str,
    pub week: i32,
    pub passing_yards: f64,
}

pub fn player_stats(season: i32, lines: &[StatLine<'_>]) -> RecordBatch {
    let n = lines.len();
    RecordBatch::try_from_iter(vec![
        ("player_id", strings(lines.iter().map(|l| l.player_id))),
        ("player_name", owned(lines.iter().map(|l| format!("Player {}", l.player_id)).collect())),
        ("recent_team", strings(lines.iter().map(|l| l.team))),
        ("season", ints(std::iter::repeat_n(season, n))),
        ("week", ints(lines.iter().map(|l| l.week))),
        ("season_type", strings(std::iter::repeat_n("REG", n))),
        ("passing_yards", floats(lines.iter().map(|l| l.passing_yards))),
    ])
    .expect("valid player stats batch")
}

pub fn players() -> RecordBatch {
    RecordBatch::try_from_iter(vec![
        ("gsis_id", strings(["00-0033873", "00-0036389", "00-0034857"])),
        ("display_name", strings(["Patrick Mahomes", "Brock Purdy", "Josh Allen"])),
        ("position", strings(["QB", "QB", "QB"])),
    ])
    .expect("valid players batch")
}

/// Serves fixture batches and records every request.
#[derive(Default)]
pub struct FixtureFetcher {
    batches: HashMap<(u16, Dataset), RecordBatch>,
    pub requests: Mutex<Vec<(u16, Dataset)>>,
}

impl FixtureFetcher {
    pub fn with(mut self, season: u16, dataset: Dataset, batch: RecordBatch) -> Self {
        let season = if dataset.is_season_scoped() { season } else { 0 };
        self.batches.insert((season, dataset), batch);
        self
    }

    pub fn requested(&self, dataset: Dataset) -> bool {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .any(|(_, d)| *d == dataset)
    }
}

impl SourceFetcher for FixtureFetcher {
    fn fetch(&self, season: u16, dataset: Dataset) -> Result<RecordBatch, FetchError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push((season, dataset));
        let key = if dataset.is_season_scoped() { season } else { 0 };
        self.batches
            .get(&(key, dataset))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                dataset,
                season,
                url: dataset.url("fixture://releases", season),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub table: String,
    pub season: Option<u16>,
    pub rows: usize,
}

/// Encodes like the real sink but keeps writes in memory.
#[derive(Default)]
pub struct RecordingSink {
    pub writes: Mutex<Vec<RecordedWrite>>,
}

impl RecordingSink {
    pub fn tables(&self) -> Vec<String> {
        self.writes
            .lock()
            .expect("writes lock")
            .iter()
            .map(|w| w.table.clone())
            .collect()
    }
}

impl SinkWriter for RecordingSink {
    fn write(
        &self,
        batch: &RecordBatch,
        table: &str,
        season: Option<u16>,
    ) -> Result<WriteReceipt, WriteError> {
        let payload = sink::encode_parquet(batch, table)?;
        self.writes.lock().expect("writes lock").push(RecordedWrite {
            table: table.to_string(),
            season,
            rows: batch.num_rows(),
        });
        Ok(WriteReceipt {
            path: sink::object_path("memory", table, season),
            bytes: payload.len(),
            sha256: sink::sha256_hex(&payload),
        })
    }
}

/// Fetcher primed with one modern or legacy season of two week-1 games.
pub fn season_fixture(season: u16) -> FixtureFetcher {
    let y = season as i32;
    let plays = [
        Play::new("G_ARI_SF", 43.0, "SF", "ARI", 1),
        Play::new("G_ARI_SF", 68.0, "SF", "ARI", 1),
        Play::new("G_KC_BUF", 1.0, "BUF", "KC", 1),
    ];
    let snaps = [
        Snap::new("G_ARI_SF", 43, "A;B", "C;D"),
        Snap::new("G_ARI_SF", 68, "A", "C"),
    ];
    let stats = [
        StatLine { player_id: "p1", team: "SF", week: 1, passing_yards: 250.0 },
        StatLine { player_id: "p2", team: "ARI", week: 1, passing_yards: 180.0 },
        StatLine { player_id: "p3", team: "KC", week: 2, passing_yards: 300.0 },
    ];
    FixtureFetcher::default()
        .with(season, Dataset::PlayByPlay, play_by_play(y, &plays))
        .with(season, Dataset::Participation, participation(&snaps))
        .with(season, Dataset::PlayerStats, player_stats(y, &stats))
        .with(season, Dataset::Players, players())
}

pub fn strings_of(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let column = batch.column_by_name(name).expect("column present");
    let cast = arrow::compute::cast(column.as_ref(), &arrow::datatypes::DataType::Utf8)
        .expect("castable to utf8");
    let values = cast
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("utf8 array");
    values.iter().map(|v| v.map(str::to_string)).collect()
}

pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}
