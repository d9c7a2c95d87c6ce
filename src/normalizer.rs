use crate::collection_resolver::format_megabytes;
use crate::gallery_types::{AlbumRecord, ExternalAsset, Photo};

const DEFAULT_NAME: &str = "Imagen";
const DEFAULT_FORMAT: &str = "IMG";
const ERROR_FORMAT: &str = "ERROR";

/// Photo for a record whose url points straight at an image.
pub fn from_record(record: &AlbumRecord) -> Photo {
    Photo {
        id: photo_id(None, record),
        url: record.url.trim().to_string(),
        carpeta: record.carpeta.clone(),
        nombre: non_blank(record.nombre.as_deref())
            .unwrap_or_else(|| DEFAULT_NAME.to_string()),
        fecha: non_blank(record.fecha.as_deref()),
        formato: Some(format_label(record.formato.as_deref())),
        size: non_blank(record.size.as_deref()),
    }
}

/// Photo for one member of a resolved collection.
pub fn from_asset(record: &AlbumRecord, asset: &ExternalAsset) -> Photo {
    let public_leaf = asset.public_id.rsplit('/').next();

    Photo {
        id: photo_id(Some(asset.public_id.as_str()), record),
        url: asset.secure_url.clone(),
        carpeta: record.carpeta.clone(),
        nombre: first_present([
            asset.filename.as_deref(),
            public_leaf,
            record.nombre.as_deref(),
        ])
        .unwrap_or_else(|| DEFAULT_NAME.to_string()),
        fecha: non_blank(Some(asset.created_at.as_str()))
            .or_else(|| non_blank(record.fecha.as_deref())),
        formato: Some(format_label(asset.format.as_deref())),
        size: Some(format_megabytes(asset.bytes)),
    }
}

/// Visible stand-in for a record that could not be resolved.
pub fn placeholder(record: &AlbumRecord, reason: &str, placeholder_url: &str) -> Photo {
    let album = if record.carpeta.trim().is_empty() {
        "Sin carpeta"
    } else {
        record.carpeta.as_str()
    };

    Photo {
        id: format!("error-{}", photo_id(None, record)),
        url: placeholder_url.to_string(),
        carpeta: record.carpeta.clone(),
        nombre: format!("⚠ Error en {album}: {}", short_reason(reason)),
        fecha: non_blank(record.fecha.as_deref()),
        formato: Some(ERROR_FORMAT.to_string()),
        size: None,
    }
}

fn photo_id(public_id: Option<&str>, record: &AlbumRecord) -> String {
    if let Some(public_id) = public_id.map(str::trim).filter(|id| !id.is_empty()) {
        return public_id.to_string();
    }
    // Store-assigned ids start at 1
    if record.id > 0 {
        return record.id.to_string();
    }
    format!("photo-{:016x}", rand::random::<u64>())
}

fn format_label(format: Option<&str>) -> String {
    non_blank(format)
        .map(|format| format.to_uppercase())
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
}

fn first_present<const N: usize>(candidates: [Option<&str>; N]) -> Option<String> {
    candidates
        .into_iter()
        .find_map(|candidate| non_blank(candidate))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn short_reason(reason: &str) -> String {
    const MAX_CHARS: usize = 80;
    let reason = reason.trim();
    if reason.chars().count() <= MAX_CHARS {
        return reason.to_string();
    }
    let truncated: String = reason.chars().take(MAX_CHARS).collect();
    format!("{truncated}…")
}
