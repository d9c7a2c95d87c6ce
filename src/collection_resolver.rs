use log::{debug, warn};
use std::fmt;
use std::str::FromStr;

use crate::classifier::CollectionRef;
use crate::credentials::Credentials;
use crate::error::GalleryError;
use crate::gallery_types::{AlbumRecord, ExternalAsset};
use crate::media_client::{AssetFetcher, StrategyOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Ask the collection-assets endpoint for the referenced collection.
    CollectionLookup,
    /// Search the folder named after the record's album.
    FolderSearch,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::CollectionLookup => "collection",
            ResolutionStrategy::FolderSearch => "folder",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collection" => Ok(ResolutionStrategy::CollectionLookup),
            "folder" => Ok(ResolutionStrategy::FolderSearch),
            other => Err(GalleryError::Configuration(format!(
                "unknown resolution strategy '{other}' (expected 'collection' or 'folder')"
            ))),
        }
    }
}

/// Ordered list of strategies tried for each collection reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPolicy {
    pub strategies: Vec<ResolutionStrategy>,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            strategies: vec![
                ResolutionStrategy::CollectionLookup,
                ResolutionStrategy::FolderSearch,
            ],
        }
    }
}

impl FromStr for ResolutionPolicy {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut strategies = Vec::new();
        for part in s.split(',').filter(|part| !part.trim().is_empty()) {
            let strategy: ResolutionStrategy = part.parse()?;
            if !strategies.contains(&strategy) {
                strategies.push(strategy);
            }
        }

        if strategies.is_empty() {
            return Err(GalleryError::Configuration(
                "resolution policy needs at least one strategy".to_string(),
            ));
        }
        Ok(Self { strategies })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Vec<ExternalAsset>),
    Failed(String),
}

pub struct CollectionResolver<'a> {
    fetcher: &'a dyn AssetFetcher,
    credentials: &'a Credentials,
    policy: &'a ResolutionPolicy,
}

impl<'a> CollectionResolver<'a> {
    pub fn new(
        fetcher: &'a dyn AssetFetcher,
        credentials: &'a Credentials,
        policy: &'a ResolutionPolicy,
    ) -> Self {
        Self {
            fetcher,
            credentials,
            policy,
        }
    }

    /// Try each strategy in policy order until one yields assets.
    ///
    /// Returns `Resolved(vec![])` when every strategy came back empty or not
    /// found, and `Failed` with the most recent failure reason when at least
    /// one strategy failed and none produced assets.
    pub async fn resolve(&self, reference: &CollectionRef, record: &AlbumRecord) -> Resolution {
        let mut last_failure: Option<String> = None;

        for strategy in &self.policy.strategies {
            match self.run(*strategy, reference, record).await {
                StrategyOutcome::Resolved(assets) => {
                    let assets = usable_assets(assets, record);
                    if !assets.is_empty() {
                        debug!(
                            "Record {}: {} strategy resolved {} assets",
                            record.id,
                            strategy,
                            assets.len()
                        );
                        return Resolution::Resolved(assets);
                    }
                    debug!("Record {}: {} strategy returned no assets", record.id, strategy);
                }
                StrategyOutcome::NotFound => {
                    debug!("Record {}: {} strategy found nothing", record.id, strategy);
                }
                StrategyOutcome::Failed(reason) => {
                    warn!(
                        "Record {}: {} strategy failed: {}",
                        record.id, strategy, reason
                    );
                    last_failure = Some(reason);
                }
            }
        }

        match last_failure {
            Some(reason) => Resolution::Failed(reason),
            None => Resolution::Resolved(Vec::new()),
        }
    }

    async fn run(
        &self,
        strategy: ResolutionStrategy,
        reference: &CollectionRef,
        record: &AlbumRecord,
    ) -> StrategyOutcome {
        match strategy {
            ResolutionStrategy::CollectionLookup => {
                let account = reference
                    .account_hint
                    .as_deref()
                    .unwrap_or(self.credentials.account_name.as_str());
                self.fetcher
                    .collection_assets(self.credentials, account, &reference.collection_id)
                    .await
            }
            ResolutionStrategy::FolderSearch => {
                let folder = record.carpeta.trim();
                if folder.is_empty() {
                    return StrategyOutcome::NotFound;
                }
                self.fetcher.folder_search(self.credentials, folder).await
            }
        }
    }
}

/// Drop assets that have no deliverable URL.
fn usable_assets(assets: Vec<ExternalAsset>, record: &AlbumRecord) -> Vec<ExternalAsset> {
    let total = assets.len();
    let usable: Vec<ExternalAsset> = assets
        .into_iter()
        .filter(|asset| !asset.secure_url.trim().is_empty())
        .collect();
    if usable.len() < total {
        warn!(
            "Record {}: skipped {} assets without a secure url",
            record.id,
            total - usable.len()
        );
    }
    usable
}

/// Asset size in megabytes with two decimals, or `N/A` when unknown.
pub fn format_megabytes(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) => format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0)),
        None => "N/A".to_string(),
    }
}
