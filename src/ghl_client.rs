use crate::circuit_breaker::{create_ghl_circuit_breaker, GhlCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::ghl_models::{
    duplicate_contact_id, object_id, unwrap_envelope, ContactOutcome, ContactRequest,
    OpportunityRequest, Pipeline,
};
use failsafe::futures::CircuitBreaker as _;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Raw GoHighLevel answer that was not a transient failure.
#[derive(Debug)]
struct GhlResponse {
    status: StatusCode,
    body: String,
}

impl GhlResponse {
    fn json(&self) -> Result<Value, AppError> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body).map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse GoHighLevel response: {}", e))
        })
    }

    fn into_error(self, operation: &str) -> AppError {
        AppError::ExternalApiError(format!(
            "GoHighLevel {} failed {}: {}",
            operation, self.status, self.body
        ))
    }
}

/// Client for the GoHighLevel (LeadConnector) REST API.
#[derive(Clone)]
pub struct GhlClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_version: String,
    location_id: String,
    max_retries: u32,
    retry_base_delay: Duration,
    breaker: Arc<GhlCircuitBreaker>,
}

impl GhlClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create GoHighLevel client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.ghl_base_url.trim_end_matches('/').to_string(),
            api_key: config.ghl_api_key.clone(),
            api_version: config.ghl_api_version.clone(),
            location_id: config.ghl_location_id.clone(),
            max_retries: config.ghl_max_retries,
            retry_base_delay: Duration::from_millis(500),
            breaker: Arc::new(create_ghl_circuit_breaker()),
        })
    }

    /// Overrides the delay before the first retry; later retries double it.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    /// Sends one request. Network errors, 429 and 5xx are returned as `Err`
    /// (and count against the circuit breaker); anything else is `Ok`.
    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<GhlResponse, AppError> {
        let mut request = self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Version", &self.api_version)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            AppError::ExternalApiError(format!("GoHighLevel request failed: {}", e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(AppError::ExternalApiError(format!(
                "GoHighLevel returned {}: {}",
                status, body
            )));
        }

        Ok(GhlResponse { status, body })
    }

    /// Sends a request through the circuit breaker, retrying transient
    /// failures with exponential backoff.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<GhlResponse, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;

        loop {
            let call = Box::pin(self.send_once(method.clone(), &url, body));
            match self.breaker.call(call).await {
                Ok(response) => {
                    tracing::debug!("GoHighLevel {} {} -> {}", method, path, response.status);
                    return Ok(response);
                }
                Err(failsafe::Error::Rejected) => {
                    tracing::warn!("GoHighLevel circuit open, rejecting {} {}", method, path);
                    return Err(AppError::ExternalApiError(
                        "GoHighLevel temporarily unavailable (circuit open)".to_string(),
                    ));
                }
                Err(failsafe::Error::Inner(e)) if attempt < self.max_retries => {
                    let delay = self.retry_base_delay * 2u32.pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "GoHighLevel {} {} failed (attempt {}/{}), retrying in {:?}: {}",
                        method,
                        path,
                        attempt,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failsafe::Error::Inner(e)) => return Err(e),
            }
        }
    }

    /// Creates a contact in the configured location.
    ///
    /// A duplicate-contact rejection is not an error: the existing contact id
    /// is returned with `duplicate` set.
    pub async fn create_contact(&self, request: &ContactRequest) -> Result<ContactOutcome, AppError> {
        let payload = serde_json::to_value(request.to_ghl_payload(&self.location_id))?;
        tracing::info!(
            "Creating GoHighLevel contact: {} {}",
            request.first_name,
            request.last_name
        );

        let response = self.send(Method::POST, "/contacts/", Some(&payload)).await?;

        if response.status == StatusCode::BAD_REQUEST {
            if let Some(existing_id) = response.json().ok().as_ref().and_then(duplicate_contact_id)
            {
                tracing::warn!("⚠️  Duplicate contact in GoHighLevel: {}", existing_id);
                return Ok(ContactOutcome {
                    contact: serde_json::json!({ "id": existing_id }),
                    contact_id: Some(existing_id),
                    duplicate: true,
                });
            }
        }

        if !response.status.is_success() {
            return Err(response.into_error("contact creation"));
        }

        let contact = unwrap_envelope(response.json()?, "contact");
        let contact_id = object_id(&contact);
        tracing::info!("✓ Contact created: {:?}", contact_id);

        Ok(ContactOutcome {
            contact,
            contact_id,
            duplicate: false,
        })
    }

    pub async fn get_pipeline(&self, pipeline_id: &str) -> Result<Pipeline, AppError> {
        let path = format!("/opportunities/pipelines/{}", pipeline_id);
        let response = self.send(Method::GET, &path, None).await?;

        if !response.status.is_success() {
            return Err(response.into_error("pipeline lookup"));
        }

        let pipeline = unwrap_envelope(response.json()?, "pipeline");
        Ok(serde_json::from_value(pipeline)?)
    }

    /// Creates an opportunity in the given pipeline, placed in its entry stage
    /// when the pipeline can be read.
    pub async fn create_opportunity(
        &self,
        pipeline_id: &str,
        request: &OpportunityRequest,
    ) -> Result<Value, AppError> {
        let stage_id = match self.get_pipeline(pipeline_id).await {
            Ok(pipeline) => pipeline.entry_stage().map(|stage| stage.id.clone()),
            Err(e) => {
                tracing::warn!(
                    "⚠️  Could not read pipeline {}, letting GoHighLevel pick the stage: {}",
                    pipeline_id,
                    e
                );
                None
            }
        };

        let payload = serde_json::to_value(request.to_ghl_payload(
            pipeline_id,
            stage_id,
            &self.location_id,
        ))?;
        tracing::info!(
            "Creating GoHighLevel opportunity '{}' for contact {}",
            request.title,
            request.contact_id
        );

        let response = self
            .send(Method::POST, "/opportunities/", Some(&payload))
            .await?;

        if !response.status.is_success() {
            return Err(response.into_error("opportunity creation"));
        }

        let opportunity = unwrap_envelope(response.json()?, "opportunity");
        tracing::info!("✓ Opportunity created: {:?}", object_id(&opportunity));
        Ok(opportunity)
    }

    /// Reads the configured location; used as a credentials probe.
    pub async fn get_location(&self) -> Result<Value, AppError> {
        let path = format!("/locations/{}", self.location_id);
        let response = self.send(Method::GET, &path, None).await?;

        if !response.status.is_success() {
            return Err(response.into_error("location lookup"));
        }

        Ok(unwrap_envelope(response.json()?, "location"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let config = Config {
            port: 3001,
            ghl_api_key: "key".to_string(),
            ghl_location_id: "loc".to_string(),
            ghl_pipeline_id: None,
            ghl_base_url: "https://example.com/".to_string(),
            ghl_api_version: "2021-07-28".to_string(),
            ghl_max_retries: 0,
        };
        let client = GhlClient::new(&config).unwrap();
        assert_eq!(client.location_id(), "loc");
        assert_eq!(client.base_url, "https://example.com");
    }
}
