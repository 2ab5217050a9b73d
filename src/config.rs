use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OdexError, Result};
use crate::query::{QueryOptions, clean_endpoint_url};

pub const CONFIG_ENV: &str = "ODEX_CONFIG";
pub const ENDPOINT_ENV: &str = "ODEX_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
    /// Path to the `$metadata` document in JSON form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PathBuf>,
}

impl EndpointConfig {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

fn default_max_navigation_depth() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default)]
    pub encode_url_components: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_top: Option<u64>,
    #[serde(default = "default_max_navigation_depth")]
    pub max_navigation_depth: usize,
    /// Where this config was read from; `None` for the built-in default.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            encode_url_components: false,
            default_top: None,
            max_navigation_depth: default_max_navigation_depth(),
            source: None,
        }
    }
}

impl ExplorerConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&raw)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for endpoint in &mut config.endpoints {
            if let Some(metadata) = &endpoint.metadata
                && metadata.is_relative()
            {
                endpoint.metadata = Some(base.join(metadata));
            }
        }
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), endpoints = config.endpoints.len(), "loaded explorer config");
        Ok(config)
    }

    /// `--config` first, then `ODEX_CONFIG`, else the empty default.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        Self::discover_from(explicit, from_env.as_deref())
    }

    pub fn discover_from(explicit: Option<&Path>, from_env: Option<&Path>) -> Result<Self> {
        match explicit.or(from_env) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        for endpoint in &self.endpoints {
            if endpoint.url.trim().is_empty() {
                return Err(OdexError::InvalidConfig(format!(
                    "endpoint '{}' has an empty url",
                    endpoint.label()
                )));
            }
        }
        if self.default_top == Some(0) {
            return Err(OdexError::InvalidConfig(
                "default_top must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Match a configured endpoint by name, or by URL after cleaning both sides.
    pub fn find_endpoint(&self, name_or_url: &str) -> Option<&EndpointConfig> {
        let wanted = name_or_url.trim();
        if let Some(found) = self
            .endpoints
            .iter()
            .find(|e| e.name.as_deref() == Some(wanted))
        {
            return Some(found);
        }
        let cleaned = clean_endpoint_url(wanted);
        self.endpoints
            .iter()
            .find(|e| clean_endpoint_url(&e.url) == cleaned)
    }

    pub fn default_endpoint(&self) -> Result<Option<&EndpointConfig>> {
        let from_env = std::env::var(ENDPOINT_ENV).ok().filter(|s| !s.is_empty());
        self.default_endpoint_from(from_env.as_deref())
    }

    pub fn default_endpoint_from(&self, from_env: Option<&str>) -> Result<Option<&EndpointConfig>> {
        match from_env {
            Some(wanted) => self
                .find_endpoint(wanted)
                .map(Some)
                .ok_or_else(|| OdexError::EndpointNotFound(wanted.to_string())),
            None => Ok(self.endpoints.first()),
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            encode_url_components: self.encode_url_components,
            max_navigation_depth: self.max_navigation_depth,
        }
    }
}
