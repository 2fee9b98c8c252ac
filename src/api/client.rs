use std::time::Duration;

use reqwest::Client;

use crate::prelude::*;

/// Build the HTTP connection shared by the API clients.
///
/// The connection is owned by the caller and handed to each client explicitly.
pub fn try_new(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("flexbridge/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}
