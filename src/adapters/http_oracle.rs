//! HTTP decision oracle.
//!
//! POSTs `{"symbol": "...", "date": "YYYY-MM-DD"}` to a fixed URL and reads
//! the recommendation from the response body.

use crate::domain::error::SigtraderError;
use crate::domain::signal::DecisionPayload;
use crate::ports::oracle_port::DecisionOracle;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct DecideRequest<'a> {
    symbol: &'a str,
    date: String,
}

pub struct HttpOracle {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpOracle {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SigtraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SigtraderError::oracle(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Interpret a response body.
///
/// An object with a `decision` field yields that field; any other JSON is a
/// structured payload; anything that is not JSON is free text.
pub fn parse_decision_body(body: &str) -> DecisionPayload {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut map)) => match map.remove("decision") {
            Some(Value::String(text)) => DecisionPayload::Text(text),
            Some(other) => DecisionPayload::Structured(other),
            None => DecisionPayload::Structured(Value::Object(map)),
        },
        Ok(Value::String(text)) => DecisionPayload::Text(text),
        Ok(other) => DecisionPayload::Structured(other),
        Err(_) => DecisionPayload::Text(body.to_string()),
    }
}

impl DecisionOracle for HttpOracle {
    fn decide(&self, symbol: &str, date: NaiveDate) -> Result<DecisionPayload, SigtraderError> {
        let request = DecideRequest {
            symbol,
            date: date.format("%Y-%m-%d").to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| SigtraderError::oracle(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SigtraderError::oracle(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        let body = response
            .text()
            .map_err(|e| SigtraderError::oracle(format!("failed to read response body: {}", e)))?;
        Ok(parse_decision_body(&body))
    }
}
