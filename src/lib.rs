pub mod config;
pub mod error;
pub mod frame;
pub mod games;
pub mod http_client;
pub mod participation;
pub mod player_stats;
pub mod players;
pub mod plays;
pub mod runner;
pub mod sink;
pub mod source_fetch;

pub use config::{PipelineConfig, SeasonContext};
pub use error::{ConfigError, FetchError, PipelineError, TransformError, WriteError};
pub use runner::{Pipeline, SeasonReport, Table, TableReport};
pub use sink::{ObjectStoreSink, SinkWriter, WriteReceipt};
pub use source_fetch::{Dataset, HttpFetcher, SeasonInput, SourceFetcher};
