use serde::Deserialize;
use warp::{reject, Filter, Rejection, Reply};

use crate::error::GalleryError;
use crate::gallery_types::folders_from_photos;
use crate::pipeline::GalleryPipeline;
use crate::warp_helpers::{with_pipeline, DatabaseError, NotFoundError};

#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    /// Restrict the listing to one album
    pub carpeta: Option<String>,
}

fn gallery_rejection(e: GalleryError) -> Rejection {
    log::error!("Gallery error: {}", e);
    reject::custom(DatabaseError {
        message: format!("Error al obtener los datos de la galería: {}", e),
    })
}

pub async fn list_gallery(
    query: GalleryQuery,
    pipeline: GalleryPipeline,
) -> Result<impl Reply, Rejection> {
    let mut photos = pipeline.get_all_photos().await.map_err(gallery_rejection)?;

    if let Some(carpeta) = query.carpeta.as_deref().map(str::trim) {
        photos.retain(|photo| photo.carpeta == carpeta);
        if photos.is_empty() {
            return Err(reject::custom(NotFoundError {
                message: format!("Álbum no encontrado: {}", carpeta),
            }));
        }
    }

    Ok(warp::reply::json(&photos))
}

pub async fn list_folders(pipeline: GalleryPipeline) -> Result<impl Reply, Rejection> {
    match pipeline.get_all_photos().await {
        Ok(photos) => Ok(warp::reply::json(&folders_from_photos(&photos))),
        Err(e) => Err(gallery_rejection(e)),
    }
}

pub fn build_gallery_routes(
    pipeline: GalleryPipeline,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api_gallery = warp::path("api")
        .and(warp::path("gallery"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<GalleryQuery>())
        .and(with_pipeline(pipeline.clone()))
        .and_then(list_gallery);

    let api_gallery_folders = warp::path("api")
        .and(warp::path("gallery"))
        .and(warp::path("folders"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_pipeline(pipeline))
        .and_then(list_folders);

    api_gallery.or(api_gallery_folders)
}
