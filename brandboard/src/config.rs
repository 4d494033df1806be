//! Environment-based configuration for the generation client.

use anyhow::{Context, Result};
use std::env;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Settings for the HTTP generation client, read from the environment
/// (a `.env` file is honored when present).
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl GenerationConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let api_key =
            env::var("BRANDBOARD_API_KEY").context("BRANDBOARD_API_KEY is not set")?;
        let base_url =
            env::var("BRANDBOARD_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("BRANDBOARD_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }
}
