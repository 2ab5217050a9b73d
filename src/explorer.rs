use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::{EndpointConfig, ExplorerConfig};
use crate::error::{OdexError, Result};
use crate::model::Metadata;
use crate::query::{QueryBuilder, clean_endpoint_url};

/// Endpoint sessions: hands out query builders, parsing each endpoint's
/// metadata at most once.
#[derive(Debug, Default)]
pub struct Explorer {
    config: ExplorerConfig,
    catalogs: HashMap<String, Arc<Catalog>>,
}

impl Explorer {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            catalogs: HashMap::new(),
        }
    }

    pub fn catalog_for(&mut self, endpoint: &EndpointConfig) -> Result<Arc<Catalog>> {
        let key = clean_endpoint_url(&endpoint.url);
        if let Some(catalog) = self.catalogs.get(&key) {
            return Ok(Arc::clone(catalog));
        }
        let path = endpoint
            .metadata
            .as_deref()
            .ok_or_else(|| OdexError::MetadataUnavailable(key.clone()))?;
        let catalog = Arc::new(Catalog::new(Metadata::load(path)?)?);
        info!(endpoint = %key, metadata = %path.display(), "loaded metadata");
        self.catalogs.insert(key, Arc::clone(&catalog));
        Ok(catalog)
    }

    pub fn builder_for(&mut self, endpoint: &EndpointConfig) -> Result<QueryBuilder> {
        let catalog = self.catalog_for(endpoint)?;
        let mut builder = QueryBuilder::new(&endpoint.url, catalog, self.config.query_options())?;
        builder.set_top(self.config.default_top);
        Ok(builder)
    }

    /// Resolve the CLI's `--endpoint`/`--metadata` pair against the config.
    ///
    /// `--endpoint` names a configured endpoint or is taken as a URL; a URL
    /// that is not configured needs `--metadata`. Without `--endpoint` the
    /// config's default endpoint is used.
    pub fn endpoint_from_args(
        &self,
        endpoint: Option<&str>,
        metadata: Option<&Path>,
    ) -> Result<EndpointConfig> {
        let mut resolved = match endpoint {
            Some(wanted) => match self.config.find_endpoint(wanted) {
                Some(found) => found.clone(),
                None if looks_like_url(wanted) => EndpointConfig {
                    name: None,
                    url: wanted.trim().to_string(),
                    metadata: None,
                },
                None => return Err(OdexError::EndpointNotFound(wanted.to_string())),
            },
            None => match self.config.default_endpoint()? {
                Some(found) => found.clone(),
                None => return Err(OdexError::MissingEndpoint),
            },
        };
        if let Some(path) = metadata {
            resolved.metadata = Some(PathBuf::from(path));
        }
        debug!(endpoint = %resolved.url, "resolved endpoint");
        Ok(resolved)
    }
}

fn looks_like_url(raw: &str) -> bool {
    let raw = raw.trim();
    raw.starts_with("http://") || raw.starts_with("https://") || raw.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn config() -> ExplorerConfig {
        ExplorerConfig {
            endpoints: vec![
                EndpointConfig {
                    name: Some("demo".into()),
                    url: "https://services.odata.org/V3/OData/OData.svc/".into(),
                    metadata: Some(fixture("odata_demo.json")),
                },
                EndpointConfig {
                    name: Some("bare".into()),
                    url: "http://host/bare.svc".into(),
                    metadata: None,
                },
            ],
            default_top: Some(20),
            ..ExplorerConfig::default()
        }
    }

    #[test]
    fn builder_applies_default_top() {
        let mut explorer = Explorer::new(config());
        let endpoint = explorer.endpoint_from_args(Some("demo"), None).unwrap();
        let builder = explorer.builder_for(&endpoint).unwrap();
        assert_eq!(builder.top(), Some(20));
        assert_eq!(
            builder.url().unwrap(),
            "https://services.odata.org/V3/OData/OData.svc/?$top=20"
        );
    }

    #[test]
    fn catalogs_are_cached_per_endpoint() {
        let mut explorer = Explorer::new(config());
        let endpoint = explorer.endpoint_from_args(Some("demo"), None).unwrap();
        let first = explorer.catalog_for(&endpoint).unwrap();
        let second = explorer.catalog_for(&endpoint).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn endpoint_without_metadata_is_unavailable() {
        let mut explorer = Explorer::new(config());
        let endpoint = explorer.endpoint_from_args(Some("bare"), None).unwrap();
        assert!(matches!(
            explorer.builder_for(&endpoint),
            Err(OdexError::MetadataUnavailable(url)) if url == "http://host/bare.svc/"
        ));
    }

    #[test]
    fn ad_hoc_url_takes_metadata_flag() {
        let explorer = Explorer::new(ExplorerConfig::default());
        let endpoint = explorer
            .endpoint_from_args(
                Some("http://localhost/inventory.svc"),
                Some(&fixture("inventory.json")),
            )
            .unwrap();
        assert_eq!(endpoint.url, "http://localhost/inventory.svc");
        assert!(endpoint.metadata.is_some());

        assert!(matches!(
            explorer.endpoint_from_args(Some("nickname"), None),
            Err(OdexError::EndpointNotFound(_))
        ));
    }
}
