use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::WeatherSettings;
use crate::error::FetchError;
use crate::models::LiveReading;

/// OpenWeatherMap reports `cod` as a number on success and often as a
/// string on failure.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseCode {
    Number(i64),
    Text(String),
}

impl ResponseCode {
    fn normalized(&self) -> String {
        match self {
            ResponseCode::Number(code) => code.to_string(),
            ResponseCode::Text(code) => code.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    cod: Option<ResponseCode>,
    main: Option<MainReading>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainReading {
    temp: Option<f64>,
}

/// Turns a current-weather payload into a reading. The service embeds its
/// own status in the body, so this is applied whatever the HTTP status was.
pub fn parse_payload(body: &str, fetched_at: DateTime<Utc>) -> Result<LiveReading, FetchError> {
    let response: WeatherResponse = serde_json::from_str(body)
        .map_err(|err| FetchError::MalformedResponse(err.to_string()))?;

    let code = response
        .cod
        .as_ref()
        .map(ResponseCode::normalized)
        .ok_or_else(|| FetchError::MalformedResponse("missing 'cod' field".to_string()))?;

    if code != "200" {
        return Err(FetchError::Api {
            code,
            message: response
                .message
                .unwrap_or_else(|| "no message returned".to_string()),
        });
    }

    let temperature = response
        .main
        .and_then(|main| main.temp)
        .ok_or_else(|| FetchError::MalformedResponse("missing 'main.temp' field".to_string()))?;

    Ok(LiveReading {
        temperature,
        fetched_at,
    })
}

pub struct WeatherClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn new(api_key: &str, settings: &WeatherSettings) -> Result<Self, FetchError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(FetchError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Current temperature in Celsius for `city`.
    pub async fn current_temperature(&self, city: &str) -> Result<LiveReading, FetchError> {
        let url = format!("{}/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, city, bytes = body.len(), "weather response received");

        let reading = parse_payload(&body, Utc::now());
        if let Err(err) = &reading {
            tracing::warn!(city, error = %err, "live weather unavailable");
        }
        reading
    }
}
