pub mod debug;
pub mod health;
pub mod migrations;
pub mod payload;
pub mod swagger;
pub mod users;

use actix_web::web;

use crate::utils::AppError;

/// Body size limit for JSON and form bodies (100 KiB)
const BODY_LIMIT: usize = 100 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().limit(BODY_LIMIT)
}

fn form_config() -> web::FormConfig {
    web::FormConfig::default().limit(BODY_LIMIT)
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid query string: {}", err))
            .or_internal("Failed to retrieve users")
            .into()
    })
}

/// Registers `/health` and every `/api` route. Static files and Swagger UI
/// are mounted by `main`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(form_config())
        .app_data(query_config())
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                .route("/users", web::get().to(users::list_users))
                .route("/users", web::post().to(users::create_user))
                .route("/users/clear/all", web::delete().to(users::clear_users))
                .route("/users/{id}", web::get().to(users::get_user))
                .route("/users/{id}", web::put().to(users::update_user))
                .route("/users/{id}", web::delete().to(users::delete_user))
                .route("/debug", web::get().to(debug::debug_snapshot))
                .route("/migrate-users-to-friends", web::post().to(migrations::migrate_users_to_friends))
                .route("/migrate-friends", web::post().to(migrations::migrate_friends)),
        );
}
