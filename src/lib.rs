pub mod classifier;
pub mod collection_resolver;
pub mod config;
pub mod credentials;
pub mod db;
pub mod db_schema;
pub mod error;
pub mod gallery_types;
pub mod handlers_gallery;
pub mod handlers_health;
pub mod media_client;
pub mod normalizer;
pub mod pipeline;
pub mod warp_helpers;
