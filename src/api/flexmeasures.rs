//! [FlexMeasures](https://flexmeasures.io) client.

mod error;
mod models;

use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client,
    Method,
    RequestBuilder,
    Response,
    StatusCode,
    Url,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;

pub use self::error::Error;
use self::models::{AuthTokenRequest, PostSensorDataRequest, TriggerScheduleRequest};
use crate::{
    core::{measurements::Measurements, schedule::ScheduleRequest},
    prelude::*,
    services::{MeasurementSink, Scheduler},
};

/// Opaque credential returned by the authentication endpoint.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(…)")
    }
}

/// How long to wait for a triggered schedule to be computed.
#[derive(Copy, Clone, Debug)]
pub struct Polling {
    pub interval: Duration,
    pub max_attempts: NonZeroU32,
}

/// Unauthenticated FlexMeasures API.
#[derive(Clone)]
pub struct Api {
    client: Client,
    base_url: Url,
    auth_timeout: Duration,
}

impl Api {
    pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(client: Client, base_url: Url) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base_url));
        }
        Ok(Self { client, base_url, auth_timeout: Self::DEFAULT_AUTH_TIMEOUT })
    }

    #[must_use]
    pub const fn with_auth_timeout(mut self, auth_timeout: Duration) -> Self {
        self.auth_timeout = auth_timeout;
        self
    }

    /// Exchange the credentials for an access token.
    ///
    /// The call is made exactly once, the caller decides whether to retry.
    #[instrument(skip_all, fields(email = email))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthToken, Error> {
        info!("authenticating…");
        let request = self
            .client
            .post(self.endpoint(&["api", "requestAuthToken"]))
            .timeout(self.auth_timeout)
            .json(&AuthTokenRequest { email, password });
        let response = read_json(send(request).await?.error_for_status()?).await?;
        let token = take_field(response, "auth_token").map(AuthToken)?;
        info!("authenticated");
        Ok(token)
    }

    /// Attach the token to all further calls.
    pub fn into_session(self, token: AuthToken, polling: Polling) -> Session {
        Session { api: self, token, polling }
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Authenticated FlexMeasures API.
pub struct Session {
    api: Api,
    token: AuthToken,
    polling: Polling,
}

impl Session {
    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.api
            .client
            .request(method, self.api.endpoint(segments))
            .header(AUTHORIZATION, self.token.as_str())
    }

    /// Ask the server to compute a new schedule and return its ID.
    #[instrument(
        skip_all,
        fields(sensor_id = %request.config.power_sensor_id, start = %request.start),
    )]
    pub async fn trigger_schedule(&self, request: &ScheduleRequest<'_>) -> Result<String, Error> {
        let sensor_id = request.config.power_sensor_id.to_string();
        let request = self
            .request(
                Method::POST,
                &["api", "v3_0", "sensors", &sensor_id, "schedules", "trigger"],
            )
            .json(&TriggerScheduleRequest::from(request));
        let response = read_json(send(request).await?.error_for_status()?).await?;
        let schedule_id: String = take_field(response, "schedule")?;
        info!(%schedule_id, "triggered");
        Ok(schedule_id)
    }

    /// Fetch the computed schedule values, waiting for the scheduling job if needed.
    #[instrument(skip_all, fields(schedule_id = schedule_id))]
    pub async fn get_schedule(
        &self,
        request: &ScheduleRequest<'_>,
        schedule_id: &str,
    ) -> Result<Vec<f64>, Error> {
        let sensor_id = request.config.power_sensor_id.to_string();
        let duration = request.config.schedule_duration.to_string();
        let max_attempts = self.polling.max_attempts.get();
        for attempt in 1..=max_attempts {
            let response = send(
                self.request(
                    Method::GET,
                    &["api", "v3_0", "sensors", &sensor_id, "schedules", schedule_id],
                )
                .query(&[("duration", &duration)]),
            )
            .await?;
            let failure = response.error_for_status_ref().err();
            if let Some(error) = failure {
                if response.status() == StatusCode::BAD_REQUEST
                    && is_unknown_schedule(response).await?
                {
                    debug!(attempt, "not ready yet");
                    if attempt < max_attempts {
                        sleep(self.polling.interval).await;
                    }
                    continue;
                }
                return Err(Error::ConnectionFailure(error));
            }
            let values: Vec<f64> = take_field(read_json(response).await?, "values")?;
            info!(n_values = values.len(), attempt, "fetched");
            return Ok(values);
        }
        Err(Error::ScheduleNotReady { attempts: max_attempts })
    }

    #[instrument(
        skip_all,
        fields(sensor_id = %measurements.sensor_id, n_values = measurements.values.len()),
    )]
    pub async fn post_sensor_data(&self, measurements: &Measurements) -> Result<(), Error> {
        let request = self
            .request(Method::POST, &["api", "v3_0", "sensors", "data"])
            .json(&PostSensorDataRequest::from(measurements));
        let response = read_json(send(request).await?.error_for_status()?).await?;
        debug!(status = ?response.get("status"), "posted");
        Ok(())
    }
}

#[async_trait]
impl Scheduler for Session {
    async fn trigger_and_get_schedule(
        &self,
        request: &ScheduleRequest<'_>,
    ) -> Result<Vec<f64>, Error> {
        let schedule_id = self.trigger_schedule(request).await?;
        self.get_schedule(request, &schedule_id).await
    }
}

#[async_trait]
impl MeasurementSink for Session {
    async fn post_measurements(&self, measurements: &Measurements) -> Result<(), Error> {
        self.post_sensor_data(measurements).await
    }
}

async fn send(request: RequestBuilder) -> Result<Response, Error> {
    Ok(request.send().await?)
}

/// Read the response body as JSON, keeping the raw body on failure.
async fn read_json(response: Response) -> Result<Value, Error> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let body = response.text().await?;
    if !content_type.contains("application/json") {
        return Err(Error::UnexpectedResponseFormat { content_type, body });
    }
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(_) => Err(Error::UnexpectedResponseFormat { content_type, body }),
    }
}

fn take_field<T: DeserializeOwned>(mut value: Value, name: &'static str) -> Result<T, Error> {
    let field = value.get_mut(name).map(Value::take).ok_or(Error::MissingField(name))?;
    serde_json::from_value(field).map_err(|source| Error::InvalidField { name, source })
}

/// The scheduling job is still queued or running.
async fn is_unknown_schedule(response: Response) -> Result<bool, Error> {
    match read_json(response).await {
        Ok(body) => Ok(body.get("status").and_then(Value::as_str) == Some("UNKNOWN_SCHEDULE")),
        Err(Error::UnexpectedResponseFormat { .. }) => Ok(false),
        Err(error) => Err(error),
    }
}
