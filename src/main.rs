use log::{error, info, warn};
use mimalloc::MiMalloc;
use std::net::{IpAddr, TcpListener};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use warp::Filter;

use galeria::config::{Config, MediaConfig};
use galeria::credentials::Credentials;
use galeria::db::{self, DbPool};
use galeria::handlers_gallery::build_gallery_routes;
use galeria::handlers_health::build_health_routes;
use galeria::media_client::{AssetFetcher, FixtureAssetFetcher, HttpAssetFetcher};
use galeria::pipeline::GalleryPipeline;
use galeria::warp_helpers::{cors, handle_rejection};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    let port = config.port;
    let host: IpAddr = config.host.parse()?;

    info!("Starting Galeria server on Port {}", port);
    info!("Database: {}", config.db_path);
    info!("Media API: {}", config.media.api_base);
    info!(
        "Resolution strategies: {:?}",
        config
            .policy
            .strategies
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
    );

    // Check if port is available BEFORE initializing services
    if !is_port_available(host, port) {
        error!(
            "Port {} is already in use. Please stop any existing Galeria instances or use a different port.",
            port
        );
        return Err(format!("Port {} is already in use", port).into());
    }

    let db_pool = db::create_db_pool(&config.db_path).await?;
    info!("Database initialized successfully");

    let pipeline = build_pipeline(&config, db_pool.clone())?;

    let routes = build_health_routes(db_pool, pipeline.clone())
        .or(build_gallery_routes(pipeline))
        .with(cors())
        .with(warp::log("galeria"))
        .recover(handle_rejection);

    info!(
        "Server started successfully, listening on http://{}:{}",
        host, port
    );

    warp::serve(routes).run((host, port)).await;

    Ok(())
}

fn is_port_available(host: IpAddr, port: u16) -> bool {
    TcpListener::bind((host, port)).is_ok()
}

fn build_pipeline(config: &Config, db_pool: DbPool) -> anyhow::Result<GalleryPipeline> {
    let fetcher = build_fetcher(&config.media)?;

    let credentials = match Credentials::parse(config.media.connection_url.as_deref()) {
        Ok(credentials) => {
            info!(
                "Media credentials loaded for account {}",
                credentials.account_name
            );
            Some(credentials)
        }
        Err(e) if config.media.fixtures_path.is_some() => {
            info!("{}; using fixture credentials", e);
            Some(Credentials {
                api_key: "fixtures".to_string(),
                api_secret: "fixtures".to_string(),
                account_name: "fixtures".to_string(),
            })
        }
        Err(e) => {
            warn!("{}; collection records will be shown as placeholders", e);
            None
        }
    };

    Ok(GalleryPipeline::new(Arc::new(db_pool), fetcher, credentials)
        .with_policy(config.policy.clone())
        .with_placeholder_url(&config.placeholder_url)
        .with_parallel_resolution(config.parallel_resolution))
}

fn build_fetcher(media: &MediaConfig) -> anyhow::Result<Arc<dyn AssetFetcher>> {
    match &media.fixtures_path {
        Some(path) => {
            info!("Serving external collections from fixtures at {}", path);
            let fetcher = FixtureAssetFetcher::from_path(Path::new(path), media.max_results)?;
            Ok(Arc::new(fetcher))
        }
        None => Ok(Arc::new(HttpAssetFetcher::new(
            &media.api_base,
            Duration::from_secs(media.timeout_secs),
            media.max_results,
        ))),
    }
}
