use super::error::{PostgrestDaoError, PostgrestResult};

/// Runtime configuration describing how to reach the PostgREST endpoint of the hosted database.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// REST root, e.g. `https://project.example.co/rest/v1`.
    pub base_url: String,
    /// Service key sent both as `apikey` header and bearer token.
    pub api_key: Option<String>,
}

impl PostgrestConfig {
    /// Construct a configuration from an explicit REST root.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Attach the API key used to authenticate against the gateway.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> PostgrestResult<Self> {
        let base_url = std::env::var("POSTGREST_URL").map_err(|_| {
            PostgrestDaoError::MissingEnvVar {
                var: "POSTGREST_URL",
            }
        })?;

        let mut config = Self::new(base_url);
        if let Some(api_key) = std::env::var("POSTGREST_API_KEY")
            .ok()
            .filter(|value| !value.is_empty())
        {
            config = config.with_api_key(api_key);
        }

        Ok(config)
    }
}
