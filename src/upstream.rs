use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_WORLDTIME_URL: &str = "http://worldtimeapi.org/api/timezone";
pub const DEFAULT_WEATHER_URL: &str = "https://app.swaggerhub.com/apis/student-73c/Weather/1.0.0";

/// The two third-party APIs the city services proxy to. One shared client
/// with a request timeout; a slow upstream fails the request instead of
/// stalling it forever. Any non-2xx or undecodable response surfaces as a
/// 500, no retries.
#[derive(Clone)]
pub struct Upstream {
    client: Client,
    worldtime_url: String,
    weather_url: String,
}

impl Upstream {
    pub fn new(
        worldtime_url: impl Into<String>,
        weather_url: impl Into<String>,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            worldtime_url: worldtime_url.into(),
            weather_url: weather_url.into(),
        })
    }

    pub fn from_env() -> reqwest::Result<Self> {
        Self::new(
            dotenv::var("WORLDTIME_API_URL").unwrap_or_else(|_| DEFAULT_WORLDTIME_URL.to_owned()),
            dotenv::var("WEATHER_API_URL").unwrap_or_else(|_| DEFAULT_WEATHER_URL.to_owned()),
        )
    }

    pub async fn current_time(&self, timezone: &str) -> ApiResult<Value> {
        self.fetch(format!("{}/{timezone}", self.worldtime_url), &[], "time")
            .await
    }

    pub async fn current_weather(&self, city: &str) -> ApiResult<Value> {
        self.fetch(
            format!("{}/current", self.weather_url),
            &[("query", city)],
            "weather",
        )
        .await
    }

    async fn fetch(&self, url: String, query: &[(&str, &str)], what: &'static str) -> ApiResult<Value> {
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(%err, upstream = what, "upstream request failed");
                ApiError::Upstream(what)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, upstream = what, %url, "upstream returned an error");
            return Err(ApiError::Upstream(what));
        }

        response.json().await.map_err(|err| {
            tracing::warn!(%err, upstream = what, "upstream sent a non-json body");
            ApiError::Upstream(what)
        })
    }
}
