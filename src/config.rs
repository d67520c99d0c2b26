use serde::Deserialize;

pub const DEFAULT_GHL_BASE_URL: &str = "https://services.leadconnectorhq.com";
pub const DEFAULT_GHL_API_VERSION: &str = "2021-07-28";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub ghl_api_key: String,
    pub ghl_location_id: String,
    /// Needed only for opportunity creation.
    pub ghl_pipeline_id: Option<String>,
    pub ghl_base_url: String,
    pub ghl_api_version: String,
    /// Extra attempts for transient GoHighLevel failures (network, 429, 5xx).
    pub ghl_max_retries: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            ghl_api_key: std::env::var("GHL_API_KEY")
                .map_err(|_| anyhow::anyhow!("GHL_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("GHL_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            ghl_location_id: std::env::var("GHL_LOCATION_ID")
                .map_err(|_| anyhow::anyhow!("GHL_LOCATION_ID environment variable required"))
                .and_then(|id| {
                    if id.trim().is_empty() {
                        anyhow::bail!("GHL_LOCATION_ID cannot be empty");
                    }
                    Ok(id)
                })?,
            ghl_pipeline_id: std::env::var("GHL_PIPELINE_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            ghl_base_url: std::env::var("GHL_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(validate_base_url)
                .transpose()?
                .unwrap_or_else(|| DEFAULT_GHL_BASE_URL.to_string()),
            ghl_api_version: std::env::var("GHL_API_VERSION")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GHL_API_VERSION.to_string()),
            ghl_max_retries: std::env::var("GHL_MAX_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("GHL_MAX_RETRIES must be a non-negative integer"))?,
        };

        // Never log the API key itself
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("GHL Base URL: {}", config.ghl_base_url);
        tracing::debug!("GHL Location ID: {}", config.ghl_location_id);
        match config.ghl_pipeline_id {
            Some(ref pipeline) => tracing::info!("GHL pipeline configured: {}", pipeline),
            None => tracing::warn!("GHL_PIPELINE_ID not set; opportunities will not be created"),
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// First ten characters of the API key, for diagnostics.
    pub fn masked_api_key(&self) -> String {
        let prefix: String = self.ghl_api_key.chars().take(10).collect();
        format!("{}...", prefix)
    }

    pub fn pipeline_id(&self) -> Result<&str, crate::errors::AppError> {
        self.ghl_pipeline_id.as_deref().ok_or_else(|| {
            crate::errors::AppError::ConfigError("GHL_PIPELINE_ID not configured".to_string())
        })
    }
}

fn validate_base_url(raw: String) -> anyhow::Result<String> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| anyhow::anyhow!("GHL_BASE_URL is not a valid URL: {}", e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("GHL_BASE_URL must start with http:// or https://");
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}
