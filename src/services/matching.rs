use crate::models::{ApproveResponse, FetchMatchesResponse, MatchQuery};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the matching service
#[derive(Debug, Error)]
pub enum MatchingServiceError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("matching service returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("matching service unavailable: {0}")]
    Unavailable(String),
}

/// External matching service contract
///
/// Scores are computed on the other side; this crate only reads them and
/// flips the approval flag.
#[async_trait]
pub trait MatchingService: Send + Sync {
    async fn fetch_matches(&self, query: &MatchQuery) -> Result<FetchMatchesResponse, MatchingServiceError>;

    async fn approve(
        &self,
        job_source: &str,
        job_id: &str,
        student_id: &str,
    ) -> Result<ApproveResponse, MatchingServiceError>;
}

/// HTTP client for the matching service
pub struct MatchingApiClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl MatchingApiClient {
    /// Create a new client with the given request timeout
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, MatchingServiceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn job_url(&self, job_source: &str, job_id: &str) -> String {
        format!(
            "{}/jobs/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(job_source),
            urlencoding::encode(job_id)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MatchingServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MatchingServiceError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        Err(MatchingServiceError::ApiError {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| status.to_string()),
        })
    }
}

/// Pull a human-readable message out of an error body (`{"error": ".."}` or `{"message": ".."}`)
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")
        .or_else(|| json.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[async_trait]
impl MatchingService for MatchingApiClient {
    async fn fetch_matches(&self, query: &MatchQuery) -> Result<FetchMatchesResponse, MatchingServiceError> {
        let url = format!("{}/matches", self.job_url(&query.job_source, &query.job_id));

        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(max_score) = query.max_score_threshold {
            params.push(("maxScore", max_score.to_string()));
        }
        if query.approved_only {
            params.push(("approvedOnly", "true".to_string()));
        }

        tracing::debug!("Fetching matches from: {}", url);

        let response = self
            .authorize(self.client.get(&url).query(&params))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let json: Value = response.json().await?;
        let parsed: FetchMatchesResponse = serde_json::from_value(json)
            .map_err(|e| MatchingServiceError::InvalidResponse(format!("Failed to parse matches: {}", e)))?;

        tracing::debug!(
            "Fetched {} matches for job {} (total: {})",
            parsed.matches.len(),
            query.job_id,
            parsed.total
        );

        Ok(parsed)
    }

    async fn approve(
        &self,
        job_source: &str,
        job_id: &str,
        student_id: &str,
    ) -> Result<ApproveResponse, MatchingServiceError> {
        let url = format!(
            "{}/matches/{}/approve",
            self.job_url(job_source, job_id),
            urlencoding::encode(student_id)
        );

        tracing::debug!("Approving student {} for job {}", student_id, job_id);

        let response = self.authorize(self.client.post(&url)).send().await?;
        let response = Self::check_status(response).await?;

        response
            .json::<ApproveResponse>()
            .await
            .map_err(|e| MatchingServiceError::InvalidResponse(format!("Failed to parse approval: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_client(base_url: &str) -> MatchingApiClient {
        MatchingApiClient::new(base_url.to_string(), None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_job_url_encodes_segments() {
        let client = create_client("https://matching.test/api/");

        assert_eq!(
            client.job_url("off campus", "17"),
            "https://matching.test/api/jobs/off%20campus/17"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"job closed"}"#), Some("job closed".to_string()));
        assert_eq!(error_message(r#"{"message":"nope"}"#), Some("nope".to_string()));
        assert_eq!(error_message("<html>"), None);
    }
}
