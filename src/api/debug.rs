use actix_web::{web, HttpResponse};

use crate::database::UserStore;
use crate::services::debug_service::{self, DebugSnapshot};

/// GET /api/debug - Snapshot de diagnóstico (contagem, amostras, coleções)
#[utoipa::path(
    get,
    path = "/api/debug",
    tag = "Diagnostics",
    responses(
        (status = 200, description = "Diagnostic snapshot", body = DebugSnapshot),
        (status = 500, description = "Debug failed")
    )
)]
pub async fn debug_snapshot(store: web::Data<dyn UserStore>) -> HttpResponse {
    match debug_service::snapshot(store.get_ref()).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => {
            log::error!("❌ Debug snapshot failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Debug failed",
                "details": e.to_string()
            }))
        }
    }
}
