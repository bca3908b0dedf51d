use actix_web::{web, HttpResponse};

use super::payload::UserPayload;
use crate::database::UserStore;
use crate::models::{
    CreateUserRequest, DeleteUserResponse, ListUsersQuery, MessageResponse, UpdateUserRequest,
    UserFilter, UserResponse,
};
use crate::services::user_service;
use crate::utils::AppError;

/// GET /api/users - Lista usuários (busca por nome e ordenação opcionais)
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserResponse>),
        (status = 500, description = "Failed to retrieve users")
    )
)]
pub async fn list_users(
    query: web::Query<ListUsersQuery>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let filter = UserFilter::from(query.into_inner());

    let users = user_service::list_users(store.get_ref(), &filter)
        .await
        .map_err(|e| e.or_internal("Failed to retrieve users"))?;

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/users/{id} - Busca pelo userId público
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Public user id, e.g. user001")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Failed to retrieve user")
    )
)]
pub async fn get_user(
    path: web::Path<String>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::get_user(store.get_ref(), &path.into_inner())
        .await
        .map_err(|e| e.or_internal("Failed to retrieve user"))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// POST /api/users - Cria usuário com o próximo userId (JSON ou form-urlencoded)
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "User already exists"),
        (status = 500, description = "Failed to add user (including missing or invalid fields)")
    )
)]
pub async fn create_user(
    body: Result<UserPayload<CreateUserRequest>, AppError>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let created = match body {
        Ok(payload) => user_service::create_user(store.get_ref(), payload.into_inner()).await,
        Err(e) => Err(e),
    };

    match created {
        Ok(user) => Ok(HttpResponse::Created().json(UserResponse::from(user))),
        Err(AppError::Conflict(cause)) => {
            log::warn!("⚠️  Duplicate userId on create: {}", cause);
            Err(AppError::Conflict("User already exists".to_string()))
        }
        Err(e) => Err(e.or_internal("Failed to add user")),
    }
}

/// PUT /api/users/{id} - Atualização parcial ou completa (JSON ou form-urlencoded)
///
/// `userId` is immutable: a body `userId` different from the path id fails.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Public user id, e.g. user001")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Failed to update user (including invalid fields or a userId change)")
    )
)]
pub async fn update_user(
    path: web::Path<String>,
    body: Result<UserPayload<UpdateUserRequest>, AppError>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let changes = body
        .map_err(|e| e.or_internal("Failed to update user"))?
        .into_inner();

    let user = user_service::update_user(store.get_ref(), &path.into_inner(), &changes)
        .await
        .map_err(|e| e.or_internal("Failed to update user"))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Public user id, e.g. user001")),
    responses(
        (status = 200, description = "User deleted", body = DeleteUserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Failed to delete user")
    )
)]
pub async fn delete_user(
    path: web::Path<String>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::delete_user(store.get_ref(), &path.into_inner())
        .await
        .map_err(|e| e.or_internal("Failed to delete user"))?;

    Ok(HttpResponse::Ok().json(DeleteUserResponse {
        message: "User deleted successfully".to_string(),
        user: UserResponse::from(user),
    }))
}

/// DELETE /api/users/clear/all - Remove todos os usuários (sem confirmação)
#[utoipa::path(
    delete,
    path = "/api/users/clear/all",
    tag = "Users",
    responses(
        (status = 200, description = "All users removed", body = MessageResponse),
        (status = 500, description = "Failed to clear users")
    )
)]
pub async fn clear_users(store: web::Data<dyn UserStore>) -> Result<HttpResponse, AppError> {
    user_service::clear_users(store.get_ref())
        .await
        .map_err(|e| e.or_internal("Failed to clear users"))?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "All users cleared from database".to_string(),
    }))
}
