//! Access to the external media service.
//!
//! The collection resolver only sees the [`AssetFetcher`] trait. Two
//! implementations exist: [`HttpAssetFetcher`] talks to the service over
//! HTTP, [`FixtureAssetFetcher`] serves canned assets from a local JSON file
//! for offline development.

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::credentials::Credentials;
use crate::gallery_types::ExternalAsset;

const API_VERSION_SEGMENT: &str = "v1_1";

/// Result of a single lookup strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Resolved(Vec<ExternalAsset>),
    NotFound,
    Failed(String),
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Members of a collection owned by `account`.
    async fn collection_assets(
        &self,
        credentials: &Credentials,
        account: &str,
        collection_id: &str,
    ) -> StrategyOutcome;

    /// Assets stored in `folder` or one of its direct children.
    async fn folder_search(&self, credentials: &Credentials, folder: &str) -> StrategyOutcome;
}

/// Search expression matching a folder and its immediate children.
pub fn folder_expression(folder: &str) -> String {
    let escaped = folder.replace('"', "\\\"");
    format!("folder=\"{escaped}\" OR folder=\"{escaped}/*\"")
}

#[derive(Debug, Deserialize)]
struct AssetListBody {
    #[serde(default)]
    assets: Option<Vec<ExternalAsset>>,
    #[serde(default)]
    resources: Option<Vec<ExternalAsset>>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    message: String,
}

/// Map an HTTP status and body onto a strategy outcome.
pub fn interpret_response(status: u16, body: &str, max_results: usize) -> StrategyOutcome {
    if status == 404 {
        return StrategyOutcome::NotFound;
    }
    if !(200..300).contains(&status) {
        return StrategyOutcome::Failed(format!("HTTP {status}"));
    }

    let parsed: AssetListBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => return StrategyOutcome::Failed(format!("malformed response body: {e}")),
    };

    match parsed.assets.or(parsed.resources) {
        Some(mut assets) => {
            assets.truncate(max_results);
            StrategyOutcome::Resolved(assets)
        }
        None => match parsed.error {
            Some(error) => StrategyOutcome::Failed(error.message),
            None => StrategyOutcome::Failed("response has no asset list".to_string()),
        },
    }
}

/// Media-service client over plain HTTP.
#[derive(Clone)]
pub struct HttpAssetFetcher {
    agent: ureq::Agent,
    api_base: String,
    max_results: usize,
}

impl HttpAssetFetcher {
    pub fn new(api_base: &str, timeout: Duration, max_results: usize) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            api_base: api_base.trim_end_matches('/').to_string(),
            max_results,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url =
            Url::parse(&self.api_base).map_err(|e| format!("invalid media api base: {e}"))?;
        url.path_segments_mut()
            .map_err(|_| "media api base cannot carry a path".to_string())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url, authorization: String) -> StrategyOutcome {
        debug!("GET {}", url);
        let response = self
            .agent
            .get(url.as_str())
            .header("Authorization", authorization.as_str())
            .query("max_results", self.max_results.to_string())
            .call();
        self.finish(response)
    }

    fn post_json(&self, url: Url, authorization: String, body: String) -> StrategyOutcome {
        debug!("POST {}", url);
        let response = self
            .agent
            .post(url.as_str())
            .header("Authorization", authorization.as_str())
            .header("Content-Type", "application/json")
            .send(body);
        self.finish(response)
    }

    fn finish(
        &self,
        response: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> StrategyOutcome {
        let mut response = match response {
            Ok(response) => response,
            Err(e) => return StrategyOutcome::Failed(format!("request failed: {e}")),
        };
        let status = response.status().as_u16();
        match response.body_mut().read_to_string() {
            Ok(body) => interpret_response(status, &body, self.max_results),
            Err(e) => StrategyOutcome::Failed(format!("could not read response body: {e}")),
        }
    }
}

async fn run_blocking<F>(request: F) -> StrategyOutcome
where
    F: FnOnce() -> StrategyOutcome + Send + 'static,
{
    tokio::task::spawn_blocking(request)
        .await
        .unwrap_or_else(|e| StrategyOutcome::Failed(format!("request task aborted: {e}")))
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn collection_assets(
        &self,
        credentials: &Credentials,
        account: &str,
        collection_id: &str,
    ) -> StrategyOutcome {
        let url = match self.endpoint(&[
            API_VERSION_SEGMENT,
            account,
            "collections",
            collection_id,
            "assets",
        ]) {
            Ok(url) => url,
            Err(reason) => return StrategyOutcome::Failed(reason),
        };
        let authorization = credentials.authorization_header();
        let client = self.clone();
        run_blocking(move || client.get(url, authorization)).await
    }

    async fn folder_search(&self, credentials: &Credentials, folder: &str) -> StrategyOutcome {
        let url = match self.endpoint(&[
            API_VERSION_SEGMENT,
            credentials.account_name.as_str(),
            "resources",
            "search",
        ]) {
            Ok(url) => url,
            Err(reason) => return StrategyOutcome::Failed(reason),
        };
        let body = serde_json::json!({
            "expression": folder_expression(folder),
            "max_results": self.max_results,
        })
        .to_string();
        let authorization = credentials.authorization_header();
        let client = self.clone();
        run_blocking(move || client.post_json(url, authorization, body)).await
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssetFixtures {
    #[serde(default)]
    pub collections: HashMap<String, Vec<ExternalAsset>>,
    #[serde(default)]
    pub folders: HashMap<String, Vec<ExternalAsset>>,
}

/// Serves collections and folders from a JSON fixture file.
#[derive(Debug)]
pub struct FixtureAssetFetcher {
    fixtures: AssetFixtures,
    max_results: usize,
}

impl FixtureAssetFetcher {
    pub fn new(fixtures: AssetFixtures, max_results: usize) -> Self {
        Self {
            fixtures,
            max_results,
        }
    }

    pub fn from_path(path: &Path, max_results: usize) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read asset fixtures {}", path.display()))?;
        let fixtures = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse asset fixtures {}", path.display()))?;
        Ok(Self::new(fixtures, max_results))
    }
}

#[async_trait]
impl AssetFetcher for FixtureAssetFetcher {
    async fn collection_assets(
        &self,
        _credentials: &Credentials,
        _account: &str,
        collection_id: &str,
    ) -> StrategyOutcome {
        match self.fixtures.collections.get(collection_id) {
            Some(assets) => {
                StrategyOutcome::Resolved(assets.iter().take(self.max_results).cloned().collect())
            }
            None => StrategyOutcome::NotFound,
        }
    }

    async fn folder_search(&self, _credentials: &Credentials, folder: &str) -> StrategyOutcome {
        let child_prefix = format!("{folder}/");
        let mut matching: Vec<(&String, &Vec<ExternalAsset>)> = self
            .fixtures
            .folders
            .iter()
            .filter(|(name, _)| {
                name.as_str() == folder
                    || name
                        .strip_prefix(&child_prefix)
                        .is_some_and(|child| !child.is_empty() && !child.contains('/'))
            })
            .collect();
        matching.sort_by(|a, b| a.0.cmp(b.0));

        let assets: Vec<ExternalAsset> = matching
            .into_iter()
            .flat_map(|(_, assets)| assets.iter().cloned())
            .take(self.max_results)
            .collect();
        StrategyOutcome::Resolved(assets)
    }
}
