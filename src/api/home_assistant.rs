use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::{
    core::{
        control_type::ControlType,
        schedule::{Schedule, ScheduleEntry},
    },
    prelude::*,
    services::Publisher,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to call Home Assistant")]
    Request(#[from] reqwest::Error),

    #[error("`{0}` cannot be used as a base URL")]
    InvalidBaseUrl(Url),
}

/// Home Assistant REST API, for example: `http://localhost:8123/api`.
pub struct Api {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl Api {
    pub const CEM_ENTITY_ID: &'static str = "flexmeasures.cem";
    pub const SCHEDULE_ENTITY_ID: &'static str = "flexmeasures.charge_schedule";

    pub fn new(client: Client, base_url: Url, access_token: String) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base_url));
        }
        Ok(Self { client, base_url, access_token })
    }

    /// Create or overwrite the entity state.
    #[instrument(skip_all, fields(entity_id = entity_id, state = state))]
    pub async fn set_state<A: Serialize + Sync>(
        &self,
        entity_id: &str,
        state: &str,
        attributes: &A,
    ) -> Result<(), Error> {
        #[derive(Serialize)]
        struct SetStateRequest<'a, A> {
            state: &'a str,
            attributes: &'a A,
        }

        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("states").push(entity_id);
        }
        self.client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&SetStateRequest { state, attributes })
            .send()
            .await?
            .error_for_status()?;
        debug!("published");
        Ok(())
    }
}

#[async_trait]
impl Publisher for Api {
    async fn publish_control_type(&self, control_type: ControlType) -> Result<(), Error> {
        #[derive(Serialize)]
        struct Attributes {
            control_type: ControlType,
        }

        self.set_state(Self::CEM_ENTITY_ID, control_type.as_str(), &Attributes { control_type })
            .await
    }

    async fn publish_schedule(&self, schedule: &Schedule) -> Result<(), Error> {
        #[derive(Serialize)]
        struct Attributes<'a> {
            schedule: &'a [ScheduleEntry],
        }

        self.set_state(
            Self::SCHEDULE_ENTITY_ID,
            &schedule.start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            &Attributes { schedule: &schedule.entries },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{FixedOffset, TimeDelta, TimeZone};
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;
    use crate::api::client;

    fn api(server: &Server) -> Api {
        let client = client::try_new(Duration::from_secs(5)).unwrap();
        let base_url = format!("{}/api", server.url()).parse().unwrap();
        Api::new(client, base_url, "test_token".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_publish_control_type() -> Result<(), Error> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/states/flexmeasures.cem")
            .match_header("authorization", "Bearer test_token")
            .match_body(Matcher::Json(json!({
                "state": "FILL_RATE_BASED_CONTROL",
                "attributes": {"control_type": "FILL_RATE_BASED_CONTROL"},
            })))
            .with_status(200)
            .create_async()
            .await;

        api(&server).publish_control_type(ControlType::FillRateBasedControl).await?;
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_schedule() -> Result<(), Box<dyn std::error::Error>> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/states/flexmeasures.charge_schedule")
            .match_header("authorization", "Bearer test_token")
            .match_body(Matcher::Json(json!({
                "state": "2024-01-01T10:15:00Z",
                "attributes": {"schedule": [
                    {"start": "2024-01-01T10:15:00Z", "value": 1.0},
                    {"start": "2024-01-01T10:30:00Z", "value": 2.0},
                ]},
            })))
            .with_status(201)
            .create_async()
            .await;

        let start =
            FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap();
        let schedule = Schedule::project(start, TimeDelta::minutes(15), [1.0, 2.0])?;
        api(&server).publish_schedule(&schedule).await?;
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_schedule_keeps_offset() -> Result<(), Box<dyn std::error::Error>> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/states/flexmeasures.charge_schedule")
            .match_body(Matcher::Json(json!({
                "state": "2024-01-01T10:15:00+01:00",
                "attributes": {"schedule": [{"start": "2024-01-01T10:15:00+01:00", "value": 1.0}]},
            })))
            .with_status(200)
            .create_async()
            .await;

        let start =
            FixedOffset::east_opt(3600).unwrap().with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap();
        let schedule = Schedule::project(start, TimeDelta::minutes(15), [1.0])?;
        api(&server).publish_schedule(&schedule).await?;
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_unauthorized() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/states/flexmeasures.cem")
            .with_status(401)
            .create_async()
            .await;

        let result = api(&server).publish_control_type(ControlType::NoSelection).await;
        assert!(matches!(result, Err(Error::Request(_))));
    }
}
