use std::fmt;
use std::time::Duration;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{PARTICIPATION_CUTOFF, SeasonContext};
use crate::error::FetchError;
use crate::http_client::http_client;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    PlayByPlay,
    Participation,
    PlayerStats,
    Players,
}

impl Dataset {
    pub fn name(self) -> &'static str {
        match self {
            Dataset::PlayByPlay => "play_by_play",
            Dataset::Participation => "participation",
            Dataset::PlayerStats => "player_stats",
            Dataset::Players => "players",
        }
    }

    pub fn is_season_scoped(self) -> bool {
        !matches!(self, Dataset::Players)
    }

    /// Release asset location under the nflverse-data release base URL.
    pub fn url(self, base_url: &str, season: u16) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            Dataset::PlayByPlay => format!("{base}/pbp/play_by_play_{season}.parquet"),
            Dataset::Participation => {
                format!("{base}/pbp_participation/pbp_participation_{season}.parquet")
            }
            Dataset::PlayerStats => format!("{base}/player_stats/player_stats_{season}.parquet"),
            Dataset::Players => format!("{base}/players/players.parquet"),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait SourceFetcher: Send + Sync {
    /// `season` is ignored for [`Dataset::Players`].
    fn fetch(&self, season: u16, dataset: Dataset) -> Result<RecordBatch, FetchError>;
}

pub struct HttpFetcher {
    client: &'static Client,
    base_url: String,
    participation_cutoff: u16,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            participation_cutoff: PARTICIPATION_CUTOFF,
        })
    }

    pub fn with_participation_cutoff(mut self, cutoff: u16) -> Self {
        self.participation_cutoff = cutoff;
        self
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(&self, season: u16, dataset: Dataset) -> Result<RecordBatch, FetchError> {
        if dataset == Dataset::Participation && season < self.participation_cutoff {
            return Err(FetchError::NoParticipation(season));
        }
        let url = dataset.url(&self.base_url, season);
        debug!(%url, %dataset, season, "requesting dataset");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                dataset,
                season,
                url,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status { status, url });
        }

        let body = resp.bytes().map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;
        let bytes = body.len();
        let batch = decode_parquet(&url, body)?;
        info!(%dataset, season, rows = batch.num_rows(), bytes, "fetched dataset");
        Ok(batch)
    }
}

/// Reads a whole parquet payload into a single batch.
pub fn decode_parquet(url: &str, body: Bytes) -> Result<RecordBatch, FetchError> {
    let decode = |source| FetchError::Decode {
        url: url.to_string(),
        source,
    };
    let builder = ParquetRecordBatchReaderBuilder::try_new(body).map_err(decode)?;
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(decode)?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| FetchError::Batches {
            url: url.to_string(),
            source,
        })?;
    concat_batches(&schema, &batches).map_err(|source| FetchError::Batches {
        url: url.to_string(),
        source,
    })
}

/// Raw datasets for one season. `participation` is present exactly when the
/// season has participation data.
#[derive(Debug, Clone)]
pub struct SeasonInput {
    pub context: SeasonContext,
    pub play_by_play: RecordBatch,
    pub participation: Option<RecordBatch>,
    pub player_stats: RecordBatch,
    pub players: RecordBatch,
}

impl SeasonInput {
    pub fn extract(
        fetcher: &dyn SourceFetcher,
        context: SeasonContext,
    ) -> Result<Self, FetchError> {
        let season = context.season;
        let play_by_play = fetcher.fetch(season, Dataset::PlayByPlay)?;
        let participation = if context.has_participation_data {
            Some(fetch_participation(fetcher, context)?)
        } else {
            None
        };
        let player_stats = fetcher.fetch(season, Dataset::PlayerStats)?;
        let players = fetcher.fetch(season, Dataset::Players)?;

        Ok(Self {
            context,
            play_by_play,
            participation,
            player_stats,
            players,
        })
    }
}

pub fn fetch_participation(
    fetcher: &dyn SourceFetcher,
    context: SeasonContext,
) -> Result<RecordBatch, FetchError> {
    if !context.has_participation_data {
        return Err(FetchError::NoParticipation(context.season));
    }
    fetcher.fetch(context.season, Dataset::Participation)
}
