use log::{debug, warn};
use url::Url;

use crate::error::{GalleryError, GalleryResult};
use crate::gallery_types::AlbumRecord;

/// Hosts starting with this label serve collection-browsing pages
/// (`https://collection.<domain>/{account}/{collectionId}`).
const COLLECTION_HOST_PREFIX: &str = "collection.";
/// Hosts starting with this label deliver single media-service assets.
const ASSET_HOST_PREFIX: &str = "res.";
const COLLECTIONS_SEGMENT: &str = "collections";
const TRAILING_ACTIONS: &[&str] = &["view", "edit"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    pub collection_id: String,
    /// Account named in the URL; `None` means "use the configured account".
    pub account_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedReference {
    DirectImage,
    SingleExternalAsset,
    CollectionReference(CollectionRef),
}

pub fn classify(record: &AlbumRecord) -> ClassifiedReference {
    let parsed = match Url::parse(record.url.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Record {} url is not absolute ({}), treating as image", record.id, e);
            return ClassifiedReference::DirectImage;
        }
    };

    match collection_reference(&parsed) {
        Ok(Some(reference)) => {
            debug!(
                "Record {} references collection {} (account hint: {:?})",
                record.id, reference.collection_id, reference.account_hint
            );
            ClassifiedReference::CollectionReference(reference)
        }
        Ok(None) => image_kind(&parsed),
        Err(e) => {
            warn!("Record {}: {}; falling back to direct image", record.id, e);
            ClassifiedReference::DirectImage
        }
    }
}

fn image_kind(parsed: &Url) -> ClassifiedReference {
    match parsed.host_str() {
        Some(host) if host.starts_with(ASSET_HOST_PREFIX) => {
            ClassifiedReference::SingleExternalAsset
        }
        _ => ClassifiedReference::DirectImage,
    }
}

/// Extract a collection reference from a URL.
///
/// `Ok(None)` means the URL has no collection shape at all; an error means it
/// looks like a collection link but no usable id could be extracted.
fn collection_reference(parsed: &Url) -> GalleryResult<Option<CollectionRef>> {
    let segments = path_segments(parsed);
    let on_collection_host = parsed
        .host_str()
        .map(|host| host.starts_with(COLLECTION_HOST_PREFIX))
        .unwrap_or(false);

    if on_collection_host {
        return match segments.as_slice() {
            [account, .., collection_id] => Ok(Some(CollectionRef {
                collection_id: collection_id.to_string(),
                account_hint: Some(account.to_string()),
            })),
            _ => Err(GalleryError::ClassificationAmbiguity(format!(
                "collection host url {} has no account/collection path",
                parsed
            ))),
        };
    }

    let Some(position) = segments.iter().position(|s| *s == COLLECTIONS_SEGMENT) else {
        return Ok(None);
    };

    // The id is the final segment once trailing actions are gone
    let collection_id = segments[position + 1..].last().ok_or_else(|| {
        GalleryError::ClassificationAmbiguity(format!("url {} has an empty collection id", parsed))
    })?;
    let account_hint = position
        .checked_sub(1)
        .and_then(|i| segments.get(i))
        .map(|s| s.to_string());

    Ok(Some(CollectionRef {
        collection_id: collection_id.to_string(),
        account_hint,
    }))
}

/// Non-empty path segments with trailing `/view` or `/edit` actions removed.
fn path_segments(parsed: &Url) -> Vec<&str> {
    let mut segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    while segments
        .last()
        .is_some_and(|last| TRAILING_ACTIONS.contains(&last.to_ascii_lowercase().as_str()))
    {
        segments.pop();
    }

    segments
}
