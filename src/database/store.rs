use async_trait::async_trait;

use crate::models::{FriendRecord, PersonKey, UpdateUserRequest, User, UserFilter};
use crate::utils::AppError;

/// Persistence seam for the two collections the service touches.
///
/// Handlers receive it as `web::Data<dyn UserStore>`; production wires the
/// MongoDB implementation, tests an in-memory one.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, AppError>;
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_key(&self, key: &PersonKey) -> Result<Option<User>, AppError>;
    async fn count_users(&self) -> Result<u64, AppError>;

    /// Inserts a user, failing with [`AppError::Conflict`] on a duplicate `userId`.
    async fn insert_user(&self, user: User) -> Result<User, AppError>;

    /// Applies the provided fields and returns the post-update document.
    async fn update_user(&self, user_id: &str, changes: &UpdateUserRequest) -> Result<Option<User>, AppError>;
    async fn delete_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Removes every user and resets the id sequence.
    async fn clear_users(&self) -> Result<u64, AppError>;

    /// Atomically allocates the next `userNNN` identifier.
    async fn next_user_id(&self) -> Result<String, AppError>;

    async fn list_friends(&self, limit: Option<i64>) -> Result<Vec<FriendRecord>, AppError>;
    async fn find_friend_by_key(&self, key: &PersonKey) -> Result<Option<FriendRecord>, AppError>;
    async fn insert_friend(&self, friend: FriendRecord) -> Result<(), AppError>;

    async fn collection_names(&self) -> Result<Vec<String>, AppError>;
    fn database_name(&self) -> String;
    async fn ping(&self) -> Result<(), AppError>;
}
