mod control_type;
mod measurements;
mod schedule;

use std::num::NonZeroU32;

use clap::{Parser, Subcommand};
use reqwest::{Client, Url};

pub use self::{
    control_type::ChangeControlTypeArgs,
    measurements::PostMeasurementsArgs,
    schedule::TriggerAndGetScheduleArgs,
};
use crate::{
    api::{
        client,
        flexmeasures::{self, Polling},
        home_assistant,
    },
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the FlexMeasures credentials and print the access token.
    #[clap(name = "authenticate")]
    Authenticate(Box<AuthenticateArgs>),

    /// Switch the CEM to another S2 control type and publish it.
    #[clap(name = "change-control-type")]
    ChangeControlType(Box<ChangeControlTypeArgs>),

    /// Trigger a new FlexMeasures schedule, then fetch and publish it.
    #[clap(name = "trigger-and-get-schedule", alias = "schedule")]
    TriggerAndGetSchedule(Box<TriggerAndGetScheduleArgs>),

    /// Forward sensor readings to FlexMeasures.
    #[clap(name = "post-measurements")]
    PostMeasurements(Box<PostMeasurementsArgs>),
}

#[derive(Parser)]
pub struct ConnectionArgs {
    /// Timeout of every HTTP request.
    #[clap(long = "request-timeout", env = "REQUEST_TIMEOUT", default_value = "10s")]
    pub request_timeout: humantime::Duration,
}

impl ConnectionArgs {
    pub fn try_new_client(&self) -> Result<Client> {
        client::try_new(self.request_timeout.into()).context("failed to build the HTTP client")
    }
}

#[derive(Parser)]
pub struct FlexMeasuresArgs {
    /// FlexMeasures server URL. For example: `http://localhost:5000`.
    #[clap(long = "flexmeasures-url", env = "FLEXMEASURES_URL")]
    pub url: Url,

    #[clap(long = "flexmeasures-email", env = "FLEXMEASURES_EMAIL")]
    pub email: String,

    #[clap(long = "flexmeasures-password", env = "FLEXMEASURES_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Timeout of the authentication request.
    #[clap(
        long = "flexmeasures-auth-timeout",
        env = "FLEXMEASURES_AUTH_TIMEOUT",
        default_value = "10s"
    )]
    pub auth_timeout: humantime::Duration,

    /// Delay between polls for a triggered schedule.
    #[clap(long = "schedule-poll-interval", env = "SCHEDULE_POLL_INTERVAL", default_value = "1s")]
    pub poll_interval: humantime::Duration,

    /// Maximum number of polls for a triggered schedule.
    #[clap(long = "schedule-max-polls", env = "SCHEDULE_MAX_POLLS", default_value = "30")]
    pub max_polls: NonZeroU32,
}

impl FlexMeasuresArgs {
    pub fn api(&self, client: Client) -> Result<flexmeasures::Api> {
        Ok(flexmeasures::Api::new(client, self.url.clone())?
            .with_auth_timeout(self.auth_timeout.into()))
    }

    /// Authenticate and return the session for further calls.
    pub async fn connect(&self, client: Client) -> Result<flexmeasures::Session> {
        let api = self.api(client)?;
        let token = api
            .authenticate(&self.email, &self.password)
            .await
            .context("failed to authenticate with FlexMeasures")?;
        let polling = Polling { interval: self.poll_interval.into(), max_attempts: self.max_polls };
        Ok(api.into_session(token, polling))
    }
}

#[derive(Parser)]
pub struct HomeAssistantArgs {
    /// Home Assistant API base URL. For example: `http://localhost:8123/api`.
    ///
    /// Without it, the results are only logged.
    #[clap(
        long = "home-assistant-api-base-url",
        env = "HOME_ASSISTANT_API_BASE_URL",
        requires = "access_token"
    )]
    pub base_url: Option<Url>,

    /// Home Assistant API access token.
    #[clap(
        long = "home-assistant-access-token",
        env = "HOME_ASSISTANT_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub access_token: Option<String>,
}

impl HomeAssistantArgs {
    pub fn try_new_publisher(&self, client: Client) -> Result<Option<home_assistant::Api>> {
        match (&self.base_url, &self.access_token) {
            (Some(base_url), Some(access_token)) => Ok(Some(home_assistant::Api::new(
                client,
                base_url.clone(),
                access_token.clone(),
            )?)),
            _ => {
                debug!("Home Assistant is not configured");
                Ok(None)
            }
        }
    }
}

#[derive(Parser)]
pub struct AuthenticateArgs {
    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[clap(flatten)]
    pub flexmeasures: FlexMeasuresArgs,
}

impl AuthenticateArgs {
    pub async fn run(&self) -> Result {
        let client = self.connection.try_new_client()?;
        let token = self
            .flexmeasures
            .api(client)?
            .authenticate(&self.flexmeasures.email, &self.flexmeasures.password)
            .await
            .context("failed to authenticate with FlexMeasures")?;
        println!("{}", token.as_str());
        Ok(())
    }
}
