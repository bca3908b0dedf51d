use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::database::UserStore;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
    /// `up` when the database answers a ping
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check(store: web::Data<dyn UserStore>) -> impl Responder {
    let database = match store.ping().await {
        Ok(()) => "up",
        Err(e) => {
            log::warn!("⚠️  Health check ping failed: {}", e);
            "down"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        database: database.to_string(),
    })
}
