use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::ConfigError;
use crate::runner::Table;

pub const PARTICIPATION_CUTOFF: u16 = 2016;
pub const DEFAULT_RELEASE_BASE_URL: &str =
    "https://github.com/nflverse/nflverse-data/releases/download";
pub const DEFAULT_STORAGE_ROOT: &str = "gs://rawnfldata/nflverse";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 180;

/// Season-level facts derived once at extract time and handed to every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonContext {
    pub season: u16,
    pub has_participation_data: bool,
}

impl SeasonContext {
    pub fn new(season: u16, participation_cutoff: u16) -> Self {
        Self {
            season,
            has_participation_data: season >= participation_cutoff,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub seasons: Vec<u16>,
    pub tables: Vec<Table>,
    pub storage_root: String,
    pub credentials_path: Option<PathBuf>,
    pub release_base_url: String,
    pub http_timeout_secs: u64,
    pub participation_cutoff: u16,
    pub parallel_seasons: bool,
    pub dry_run: bool,
}

impl PipelineConfig {
    pub fn new(seasons: Vec<u16>) -> Self {
        Self {
            seasons,
            tables: Table::ALL.to_vec(),
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
            credentials_path: None,
            release_base_url: DEFAULT_RELEASE_BASE_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            participation_cutoff: PARTICIPATION_CUTOFF,
            parallel_seasons: false,
            dry_run: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seasons.is_empty() {
            return Err(ConfigError::NoSeasons);
        }
        if self.tables.is_empty() {
            return Err(ConfigError::NoTables);
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Parses `2016-2023,2010` style season lists. Order is kept, repeats dropped.
pub fn parse_seasons(raw: &str) -> Result<Vec<u16>, ConfigError> {
    let mut out = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((start, end)) = part.split_once('-') {
            let start = parse_year(start, part)?;
            let end = parse_year(end, part)?;
            if end < start {
                return Err(ConfigError::BackwardsRange(part.to_string()));
            }
            out.extend(start..=end);
        } else {
            out.push(parse_year(part, part)?);
        }
    }
    if out.is_empty() {
        return Err(ConfigError::NoSeasons);
    }
    Ok(dedup(out))
}

pub fn parse_tables(raw: &str) -> Result<Vec<Table>, ConfigError> {
    let mut out = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        out.push(part.parse::<Table>()?);
    }
    if out.is_empty() {
        return Err(ConfigError::NoTables);
    }
    Ok(dedup(out))
}

fn parse_year(raw: &str, whole: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|year| *year != 0)
        .ok_or_else(|| ConfigError::BadSeason(whole.to_string()))
}

fn dedup<T: Copy + Eq + std::hash::Hash>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item) {
            out.push(item);
        }
    }
    out
}
