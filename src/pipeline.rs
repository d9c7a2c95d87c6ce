//! Gallery resolution pipeline.
//!
//! Reads every album record once, classifies each one, expands collection
//! references through the media service and normalizes the result into
//! [`Photo`]s. Failures are contained per record: a record that cannot be
//! resolved becomes a single placeholder photo and the batch carries on.
//! Only a failed store read aborts the whole call.

use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::classifier::{classify, ClassifiedReference, CollectionRef};
use crate::collection_resolver::{CollectionResolver, Resolution, ResolutionPolicy};
use crate::credentials::Credentials;
use crate::db::AlbumSource;
use crate::error::{GalleryError, GalleryResult};
use crate::gallery_types::{AlbumRecord, Photo};
use crate::media_client::AssetFetcher;
use crate::normalizer;

pub const DEFAULT_PLACEHOLDER_URL: &str =
    "https://placehold.co/800x600/1f2937/e5e7eb?text=Contenido+no+disponible";

const REASON_MISSING_URL: &str = "sin URL";
const REASON_DISABLED: &str = "colecciones externas deshabilitadas";
const REASON_EMPTY: &str = "colección vacía";
const REASON_ABORTED: &str = "error interno";

#[derive(Clone)]
pub struct GalleryPipeline {
    store: Arc<dyn AlbumSource>,
    fetcher: Arc<dyn AssetFetcher>,
    credentials: Option<Arc<Credentials>>,
    policy: Arc<ResolutionPolicy>,
    placeholder_url: Arc<str>,
    parallel: bool,
}

impl GalleryPipeline {
    /// `credentials` of `None` disables collection expansion; direct images
    /// are still served.
    pub fn new(
        store: Arc<dyn AlbumSource>,
        fetcher: Arc<dyn AssetFetcher>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            store,
            fetcher,
            credentials: credentials.map(Arc::new),
            policy: Arc::new(ResolutionPolicy::default()),
            placeholder_url: Arc::from(DEFAULT_PLACEHOLDER_URL),
            parallel: false,
        }
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_placeholder_url(mut self, placeholder_url: &str) -> Self {
        self.placeholder_url = Arc::from(placeholder_url);
        self
    }

    /// Resolve records concurrently. Output order is unchanged.
    pub fn with_parallel_resolution(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn external_resolution_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Every photo in the gallery, in record order, with collection members
    /// expanded in place of their source record.
    pub async fn get_all_photos(&self) -> GalleryResult<Vec<Photo>> {
        let records = self.store.fetch_albums().await.map_err(|e| {
            error!("Failed to read album records: {}", e);
            e
        })?;
        info!(
            "Resolving {} album records (parallel: {})",
            records.len(),
            self.parallel
        );

        let mut photos = if self.parallel {
            self.resolve_concurrently(records).await
        } else {
            self.resolve_sequentially(&records).await
        };
        ensure_unique_ids(&mut photos);

        info!("Gallery resolved into {} photos", photos.len());
        Ok(photos)
    }

    async fn resolve_sequentially(&self, records: &[AlbumRecord]) -> Vec<Photo> {
        let mut photos = Vec::with_capacity(records.len());
        for record in records {
            photos.extend(self.resolve_record(record).await);
        }
        photos
    }

    async fn resolve_concurrently(&self, records: Vec<AlbumRecord>) -> Vec<Photo> {
        let tasks: Vec<_> = records
            .into_iter()
            .map(|record| {
                let pipeline = self.clone();
                let task_record = record.clone();
                let handle =
                    tokio::spawn(async move { pipeline.resolve_record(&task_record).await });
                (record, handle)
            })
            .collect();

        // Awaiting in spawn order keeps the output in record order
        let mut photos = Vec::with_capacity(tasks.len());
        for (record, handle) in tasks {
            match handle.await {
                Ok(resolved) => photos.extend(resolved),
                Err(e) => {
                    error!("Resolution task for record {} aborted: {}", record.id, e);
                    photos.push(self.placeholder(&record, REASON_ABORTED));
                }
            }
        }
        photos
    }

    /// Photos produced by one record. Never empty.
    pub async fn resolve_record(&self, record: &AlbumRecord) -> Vec<Photo> {
        if record.url.trim().is_empty() {
            warn!("Record {} has no url", record.id);
            return vec![self.placeholder(record, REASON_MISSING_URL)];
        }

        match classify(record) {
            ClassifiedReference::DirectImage => vec![normalizer::from_record(record)],
            ClassifiedReference::SingleExternalAsset => {
                debug!("Record {} is a single hosted asset", record.id);
                vec![normalizer::from_record(record)]
            }
            ClassifiedReference::CollectionReference(reference) => {
                self.expand_collection(record, &reference).await
            }
        }
    }

    async fn expand_collection(
        &self,
        record: &AlbumRecord,
        reference: &CollectionRef,
    ) -> Vec<Photo> {
        let Some(credentials) = self.credentials.as_deref() else {
            warn!(
                "Record {} references collection {} but no media credentials are configured",
                record.id, reference.collection_id
            );
            return vec![self.placeholder(record, REASON_DISABLED)];
        };

        let resolver = CollectionResolver::new(self.fetcher.as_ref(), credentials, &self.policy);
        match resolver.resolve(reference, record).await {
            Resolution::Resolved(assets) if assets.is_empty() => {
                warn!(
                    "Record {}: collection {} has no assets",
                    record.id, reference.collection_id
                );
                vec![self.placeholder(record, REASON_EMPTY)]
            }
            Resolution::Resolved(assets) => assets
                .iter()
                .map(|asset| normalizer::from_asset(record, asset))
                .collect(),
            Resolution::Failed(reason) => {
                warn!(
                    "Record {}: {}",
                    record.id,
                    GalleryError::Resolution(reason.clone())
                );
                vec![self.placeholder(record, &reason)]
            }
        }
    }

    fn placeholder(&self, record: &AlbumRecord, reason: &str) -> Photo {
        normalizer::placeholder(record, reason, &self.placeholder_url)
    }
}

/// Suffix repeated ids with `-2`, `-3`, ... so every id in a batch is unique.
fn ensure_unique_ids(photos: &mut [Photo]) {
    let mut used: HashSet<String> = HashSet::with_capacity(photos.len());
    for photo in photos.iter_mut() {
        if used.insert(photo.id.clone()) {
            continue;
        }
        let base = photo.id.clone();
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if used.insert(candidate.clone()) {
                debug!("Duplicate photo id {} renamed to {}", base, candidate);
                photo.id = candidate;
                break;
            }
            n += 1;
        }
    }
}
