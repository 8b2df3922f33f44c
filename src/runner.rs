use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use arrow::record_batch::RecordBatch;
use once_cell::unsync::OnceCell;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::{PipelineConfig, SeasonContext};
use crate::error::{ConfigError, PipelineError, TransformError};
use crate::sink::{ObjectStoreSink, SinkWriter, WriteReceipt};
use crate::source_fetch::{HttpFetcher, SeasonInput, SourceFetcher};
use crate::{games, participation, player_stats, players, plays};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Games,
    Plays,
    Participation,
    Players,
    Stats,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Games,
        Table::Plays,
        Table::Participation,
        Table::Players,
        Table::Stats,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Games => "games",
            Table::Plays => "plays",
            Table::Participation => "participation",
            Table::Players => "players",
            Table::Stats => "stats",
        }
    }

    /// File stem used in the object store.
    pub fn storage_name(self) -> &'static str {
        match self {
            Table::Games => "games",
            Table::Plays => "pbp",
            Table::Participation => "pbppart",
            Table::Players => "players",
            Table::Stats => "stats",
        }
    }

    pub fn is_season_scoped(self) -> bool {
        !matches!(self, Table::Players)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        Table::ALL
            .into_iter()
            .find(|table| table.name() == wanted || table.storage_name() == wanted)
            .ok_or_else(|| ConfigError::UnknownTable(raw.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: Table,
    pub rows: usize,
    pub receipt: Option<WriteReceipt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonReport {
    pub season: u16,
    pub has_participation_data: bool,
    pub tables: Vec<TableReport>,
    pub skipped: Vec<Table>,
}

pub struct Pipeline<'a> {
    fetcher: &'a dyn SourceFetcher,
    sink: Option<&'a dyn SinkWriter>,
    tables: Vec<Table>,
    participation_cutoff: u16,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a dyn SourceFetcher, tables: Vec<Table>) -> Self {
        Self {
            fetcher,
            sink: None,
            tables,
            participation_cutoff: crate::config::PARTICIPATION_CUTOFF,
        }
    }

    /// Without a sink the pipeline transforms and reports but writes nothing.
    pub fn with_sink(mut self, sink: &'a dyn SinkWriter) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_participation_cutoff(mut self, cutoff: u16) -> Self {
        self.participation_cutoff = cutoff;
        self
    }

    pub fn run_season(&self, season: u16) -> Result<SeasonReport, PipelineError> {
        let context = SeasonContext::new(season, self.participation_cutoff);
        info!(
            season,
            has_participation_data = context.has_participation_data,
            "extracting season"
        );
        let input = SeasonInput::extract(self.fetcher, context)?;

        // Built at most once and shared by the games load and the stats join.
        let games_cell = OnceCell::new();
        let mut report = SeasonReport {
            season,
            has_participation_data: context.has_participation_data,
            tables: Vec::with_capacity(self.tables.len()),
            skipped: Vec::new(),
        };

        for &table in &self.tables {
            let output = transform_table(table, &input, &games_cell).map_err(|source| {
                PipelineError::Transform {
                    table: table.name(),
                    source,
                }
            })?;
            let Some(batch) = output else {
                info!(season, %table, "no output, skipping load");
                report.skipped.push(table);
                continue;
            };
            info!(season, %table, rows = batch.num_rows(), "transformed table");

            let receipt = match self.sink {
                Some(sink) => Some(sink.write(
                    &batch,
                    table.storage_name(),
                    table.is_season_scoped().then_some(season),
                )?),
                None => None,
            };
            report.tables.push(TableReport {
                table,
                rows: batch.num_rows(),
                receipt,
            });
        }
        Ok(report)
    }

    /// Seasons are independent; with `parallel` they run on the rayon pool.
    /// Either way the first failure is returned.
    pub fn run(&self, seasons: &[u16], parallel: bool) -> Result<Vec<SeasonReport>, PipelineError> {
        if parallel {
            seasons
                .par_iter()
                .map(|season| self.run_season(*season))
                .collect()
        } else {
            seasons
                .iter()
                .map(|season| self.run_season(*season))
                .collect()
        }
    }
}

fn transform_table(
    table: Table,
    input: &SeasonInput,
    games_cell: &OnceCell<RecordBatch>,
) -> Result<Option<RecordBatch>, TransformError> {
    let shared_games = || games_cell.get_or_try_init(|| games::transform(&input.play_by_play));
    match table {
        Table::Games => shared_games().cloned().map(Some),
        Table::Plays => {
            plays::transform(&input.play_by_play, input.participation.as_ref()).map(Some)
        }
        Table::Participation => participation::transform(input.participation.as_ref()),
        Table::Players => Ok(Some(players::transform(&input.players))),
        Table::Stats => player_stats::transform(&input.player_stats, shared_games()?).map(Some),
    }
}

/// Runs every configured season against the live release archive and store.
pub fn run(config: &PipelineConfig) -> Result<Vec<SeasonReport>, PipelineError> {
    config.validate()?;
    let fetcher = HttpFetcher::new(
        config.release_base_url.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?
    .with_participation_cutoff(config.participation_cutoff);
    let sink = if config.dry_run {
        None
    } else {
        Some(ObjectStoreSink::from_root(
            &config.storage_root,
            config.credentials_path.as_deref(),
        )?)
    };

    let mut pipeline = Pipeline::new(&fetcher, config.tables.clone())
        .with_participation_cutoff(config.participation_cutoff);
    if let Some(sink) = sink.as_ref() {
        pipeline = pipeline.with_sink(sink);
    }
    pipeline.run(&config.seasons, config.parallel_seasons)
}
