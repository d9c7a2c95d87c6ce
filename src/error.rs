use thiserror::Error;

/// Failure classes of the gallery resolution pipeline.
///
/// Only `StoreRead` aborts a `get_all_photos` call. The other variants are
/// caught per record and rendered as placeholder photos.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Ambiguous collection reference: {0}")]
    ClassificationAmbiguity(String),
    #[error("Resolution failed: {0}")]
    Resolution(String),
    #[error("Store read failed: {0}")]
    StoreRead(#[from] sqlx::Error),
}

pub type GalleryResult<T> = Result<T, GalleryError>;
