mod api;
mod cli;
mod core;
mod prelude;
mod services;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    prelude::*,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    if let Some(error) = dotenv_failure(dotenv) {
        warn!("failed to load `.env`: {error:#}");
    }
    info!(version = crate_version!(), "starting…");

    let result = match Args::parse().command {
        Command::Authenticate(args) => args.run().await,
        Command::ChangeControlType(args) => args.run().await,
        Command::TriggerAndGetSchedule(args) => args.run().await,
        Command::PostMeasurements(args) => args.run().await,
    };
    if let Err(error) = &result {
        error!("{error:#}");
    } else {
        info!("done!");
    }
    result
}

/// A missing `.env` is fine, anything else is worth reporting.
fn dotenv_failure<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    result.err().filter(|error| !error.not_found())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotenv_missing_is_ignored() {
        assert!(dotenv_failure(dotenvy::from_filename("definitely-missing.env")).is_none());
    }

    #[test]
    fn test_dotenv_malformed_is_reported() {
        let result = dotenvy::from_read(&b"FLEXBRIDGE_TEST=\"unterminated\n"[..]);
        assert!(dotenv_failure(result).is_some());
    }
}
