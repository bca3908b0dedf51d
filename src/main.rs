mod api;
mod config;
mod database;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::database::{MongoDB, UserStore};

fn build_cors(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();

    log::info!("🚀 Starting User Directory Service...");
    log::info!("📊 Database: {}", config.database_url);

    // Pool compartilhado por todos os workers
    let db = MongoDB::new(&config.database_url)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let store: Arc<dyn UserStore> = Arc::new(db);
    let store_data = web::Data::from(store);

    let host = config.host.clone();
    let port = config.port;

    log::info!("🌐 App Server listening on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📁 Static files served from ./{}", config.static_dir);

    HttpServer::new(move || {
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(store_data.clone())
            .wrap(build_cors(&config.cors_allowed_origins))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
            // Landing page e assets (precisa ficar por último: casa qualquer caminho)
            .service(
                actix_files::Files::new("/", &config.static_dir)
                    .index_file("index.html")
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
