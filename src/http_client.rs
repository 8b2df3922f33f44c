use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use tracing::warn;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("nflverse-etl/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<(Client, Duration)> = OnceCell::new();

// Built once per process; the first caller's timeout wins.
pub fn http_client(timeout: Duration) -> Result<&'static Client, FetchError> {
    let (client, configured) = CLIENT.get_or_try_init(|| {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map(|client| (client, timeout))
            .map_err(FetchError::Client)
    })?;
    if *configured != timeout {
        warn!(
            requested_secs = timeout.as_secs(),
            configured_secs = configured.as_secs(),
            "http client already built; keeping its timeout"
        );
    }
    Ok(client)
}

pub fn configured_timeout() -> Option<Duration> {
    CLIENT.get().map(|(_, timeout)| *timeout)
}
