use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::{error, info};

use tabular_serve::api;
use tabular_serve::artifact::Artifacts;
use tabular_serve::config::AppConfig;
use tabular_serve::InferencePipeline;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = AppConfig::from_env()?;

    // Refuse to serve anything without both artifacts.
    let artifacts = Artifacts::load(&config.artifacts_dir)
        .inspect_err(|e| error!("Refusing to start: {e}"))?;
    let pipeline = web::Data::new(InferencePipeline::from(artifacts));

    info!("Serving on http://{}:{}", config.host, config.port);
    info!("Workers: {}", config.workers);
    info!("   GET|HEAD /         - liveness");
    info!("   POST     /predict  - predictions");

    let body_limit = config.max_body_bytes;
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(pipeline.clone())
            .app_data(api::json_config(body_limit))
            .configure(api::configure)
    })
    .workers(config.workers)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
