use reqwest::Url;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("timeout occurred while connecting to FlexMeasures")]
    ConnectionTimeout(#[source] reqwest::Error),

    #[error("error occurred while communicating with FlexMeasures")]
    ConnectionFailure(#[source] reqwest::Error),

    /// The response is not JSON.
    #[error("unexpected `{content_type}` response from FlexMeasures")]
    UnexpectedResponseFormat { content_type: String, body: String },

    #[error("`{0}` is missing in the FlexMeasures response")]
    MissingField(&'static str),

    #[error("`{name}` in the FlexMeasures response has an unexpected shape")]
    InvalidField {
        name: &'static str,

        #[source]
        source: serde_json::Error,
    },

    #[error("the schedule is not ready after {attempts} attempts")]
    ScheduleNotReady { attempts: u32 },

    #[error("`{0}` cannot be used as a base URL")]
    InvalidBaseUrl(Url),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() { Self::ConnectionTimeout(error) } else { Self::ConnectionFailure(error) }
    }
}
