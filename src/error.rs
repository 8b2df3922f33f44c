use arrow::error::ArrowError;
use parquet::errors::ParquetError;

use crate::source_fetch::Dataset;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("participation data is not published for legacy season {0}")]
    NoParticipation(u16),

    #[error("{dataset} not found for season {season} at {url}")]
    NotFound {
        dataset: Dataset,
        season: u16,
        url: String,
    },

    #[error("http {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("request {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),

    #[error("decode parquet from {url}")]
    Decode {
        url: String,
        #[source]
        source: ParquetError,
    },

    #[error("read record batches from {url}")]
    Batches {
        url: String,
        #[source]
        source: ArrowError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("input is missing required column `{0}`")]
    MissingColumn(String),

    #[error("column `{column}` holds unparsable date {value:?}")]
    UnparsableDate { column: String, value: String },

    #[error("duplicate {what} key {key} would fan out the join")]
    DuplicateKey { what: &'static str, key: String },

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("object store setup for {root} failed")]
    Auth {
        root: String,
        #[source]
        source: object_store::Error,
    },

    #[error("storage root {0:?} is not a valid location")]
    InvalidRoot(String),

    #[error("create local storage directory {path}")]
    LocalDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("start upload runtime")]
    Runtime(#[source] std::io::Error),

    #[error("encode {table} as parquet")]
    Encode {
        table: String,
        #[source]
        source: ParquetError,
    },

    #[error("upload {path} failed")]
    Upload {
        path: String,
        #[source]
        source: object_store::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("transform {table} failed")]
    Transform {
        table: &'static str,
        #[source]
        source: TransformError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no seasons configured")]
    NoSeasons,

    #[error("no tables configured")]
    NoTables,

    #[error("invalid season {0:?}")]
    BadSeason(String),

    #[error("season range {0:?} runs backwards")]
    BackwardsRange(String),

    #[error("unknown table {0:?}")]
    UnknownTable(String),

    #[error("http timeout must be at least one second")]
    ZeroTimeout,
}
