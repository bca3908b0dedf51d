use actix_web::{web, HttpResponse};

use crate::database::UserStore;
use crate::services::migration_service::{self, FriendsToUsersReport, UsersToFriendsReport};
use crate::utils::AppError;

fn migration_failed(e: &AppError) -> HttpResponse {
    log::error!("❌ Migration failed: {}", e);
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": "Migration failed",
        "details": e.to_string(),
        "stack": format!("{:?}", e),
        "success": false
    }))
}

/// POST /api/migrate-users-to-friends
#[utoipa::path(
    post,
    path = "/api/migrate-users-to-friends",
    tag = "Migrations",
    responses(
        (status = 200, description = "Migration report", body = UsersToFriendsReport),
        (status = 500, description = "Migration failed")
    )
)]
pub async fn migrate_users_to_friends(store: web::Data<dyn UserStore>) -> HttpResponse {
    match migration_service::migrate_users_to_friends(store.get_ref()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => migration_failed(&e),
    }
}

/// POST /api/migrate-friends
#[utoipa::path(
    post,
    path = "/api/migrate-friends",
    tag = "Migrations",
    responses(
        (status = 200, description = "Migration report", body = FriendsToUsersReport),
        (status = 500, description = "Migration failed")
    )
)]
pub async fn migrate_friends(store: web::Data<dyn UserStore>) -> HttpResponse {
    match migration_service::migrate_friends_to_users(store.get_ref()).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => migration_failed(&e),
    }
}
