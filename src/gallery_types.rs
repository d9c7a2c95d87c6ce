use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// One row of the `gallery` table: either a single picture or a link to an
/// externally hosted collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlbumRecord {
    pub id: i64,
    pub url: String,
    /// Album name
    pub carpeta: String,
    pub nombre: Option<String>,
    pub fecha: Option<String>,
    pub formato: Option<String>,
    pub size: Option<String>,
}

/// Asset as returned by the media service collection and search endpoints.
///
/// Missing or null string fields decode as empty; the normalizer supplies
/// fallbacks so one incomplete asset never spoils the rest of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalAsset {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub public_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub secure_url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Canonical, display-ready photo handed to the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub url: String,
    pub carpeta: String,
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formato: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Sorted, de-duplicated album names present in a photo list.
pub fn folders_from_photos(photos: &[Photo]) -> Vec<String> {
    photos
        .iter()
        .map(|photo| photo.carpeta.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
