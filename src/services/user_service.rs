use validator::Validate;

use crate::database::UserStore;
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserFilter};
use crate::utils::AppError;

fn validate<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(format!("Validation failed: {}", e)))
}

pub async fn list_users(store: &dyn UserStore, filter: &UserFilter) -> Result<Vec<User>, AppError> {
    store.list_users(filter).await
}

pub async fn get_user(store: &dyn UserStore, user_id: &str) -> Result<User, AppError> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Validates the body, allocates the next `userId` and inserts.
pub async fn create_user(store: &dyn UserStore, req: CreateUserRequest) -> Result<User, AppError> {
    validate(&req)?;

    let user_id = store.next_user_id().await?;
    let user = User::new(user_id, req.first_name, req.last_name, req.email, req.age);

    let saved = store.insert_user(user).await?;
    log::info!("👤 User created: {}", saved.user_id);
    Ok(saved)
}

pub async fn update_user(store: &dyn UserStore, user_id: &str, changes: &UpdateUserRequest) -> Result<User, AppError> {
    validate(changes)?;
    if changes.user_id.as_deref().is_some_and(|requested| requested != user_id) {
        return Err(AppError::Validation("userId cannot be changed".to_string()));
    }

    store
        .update_user(user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn delete_user(store: &dyn UserStore, user_id: &str) -> Result<User, AppError> {
    let deleted = store
        .delete_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    log::info!("🗑️  User deleted: {}", deleted.user_id);
    Ok(deleted)
}

pub async fn clear_users(store: &dyn UserStore) -> Result<(), AppError> {
    let removed = store.clear_users().await?;
    log::warn!("🧹 Cleared users collection ({} documents)", removed);
    Ok(())
}
