// ─── Repository HTTP ───
// Artifacts are verified byte-for-byte against their digests, so transfer
// encoding is pinned to identity.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::error::BootResult;

pub const USER_AGENT: &str = concat!("patchboot/", env!("CARGO_PKG_VERSION"));

/// Unreachable repositories fail fast; large bodies are not time-boxed.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Client used for every remote repository request.
pub fn repository_client() -> BootResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    Ok(client)
}
