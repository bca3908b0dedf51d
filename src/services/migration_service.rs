// ==================== USERS <-> FRIENDS MIGRATIONS ====================
// Cópias em lote entre `users` e `friends`. Falhas por registro são
// acumuladas em `errors`; nada é revertido. Rodar de novo pula o que já
// foi migrado (mesmo firstName/lastName/email).

use serde::Serialize;

use crate::database::UserStore;
use crate::models::{FriendConversionError, FriendRecord, PersonKey, User, UserFilter};
use crate::utils::AppError;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsersToFriendsReport {
    pub message: String,
    pub total_users: usize,
    pub migrated_count: usize,
    pub errors: Vec<String>,
    pub success: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendsToUsersReport {
    pub message: String,
    pub total_friends: usize,
    pub migrated_count: usize,
    pub errors: Vec<String>,
    pub success: bool,
}

/// Copies every user into `friends` unless a friend with the same
/// (firstname, lastname, email) already exists.
pub async fn migrate_users_to_friends(store: &dyn UserStore) -> Result<UsersToFriendsReport, AppError> {
    let users = store.list_users(&UserFilter::default()).await?;
    log::info!("🔄 Found {} users to migrate", users.len());

    let mut migrated_count = 0;
    let mut errors = Vec::new();

    for user in &users {
        log::debug!("Processing user: {}", user.user_id);
        match copy_user_to_friend(store, user).await {
            Ok(true) => {
                migrated_count += 1;
                log::debug!("Migrated user to friend: {} {}", user.first_name, user.last_name);
            }
            Ok(false) => log::debug!("Friend already exists: {} {}", user.first_name, user.last_name),
            Err(e) => {
                log::warn!("⚠️  Error migrating user {}: {}", user.user_id, e);
                errors.push(format!("Error with user {}: {}", user.user_id, e));
            }
        }
    }

    log::info!("✅ Migration completed: {}/{} users copied to friends", migrated_count, users.len());

    Ok(UsersToFriendsReport {
        message: format!(
            "Migration completed. {} users migrated to friends collection",
            migrated_count
        ),
        total_users: users.len(),
        migrated_count,
        errors,
        success: true,
    })
}

async fn copy_user_to_friend(store: &dyn UserStore, user: &User) -> Result<bool, AppError> {
    if store.find_friend_by_key(&PersonKey::of_user(user)).await?.is_some() {
        return Ok(false);
    }
    store.insert_friend(FriendRecord::from_user(user)).await?;
    Ok(true)
}

/// Creates a user for every friend record that has all required fields and
/// no matching (firstName, lastName, email) user yet.
pub async fn migrate_friends_to_users(store: &dyn UserStore) -> Result<FriendsToUsersReport, AppError> {
    let friends = store.list_friends(None).await?;
    log::info!("🔄 Found {} friends to migrate", friends.len());

    let mut migrated_count = 0;
    let mut errors = Vec::new();

    for friend in &friends {
        log::debug!("Processing friend: {}", friend.display_id());

        let candidate = match friend.to_candidate() {
            Ok(candidate) => candidate,
            Err(FriendConversionError::MissingFields) => {
                errors.push(format!("Missing required fields for friend: {}", friend.to_json()));
                continue;
            }
            Err(e) => {
                errors.push(format!("Error with friend {}: {}", friend.display_id(), e));
                continue;
            }
        };

        match copy_friend_to_user(store, &candidate.key, candidate.age).await {
            Ok(Some(user_id)) => {
                migrated_count += 1;
                log::debug!("Migrated friend as {}", user_id);
            }
            Ok(None) => log::debug!(
                "User already exists: {} {}",
                candidate.key.first_name, candidate.key.last_name
            ),
            Err(e) => {
                log::warn!("⚠️  Error migrating friend {}: {}", friend.display_id(), e);
                errors.push(format!("Error with friend {}: {}", friend.display_id(), e));
            }
        }
    }

    log::info!("✅ Migration completed: {}/{} friends copied to users", migrated_count, friends.len());

    Ok(FriendsToUsersReport {
        message: format!("Migration completed. {} friends migrated to users", migrated_count),
        total_friends: friends.len(),
        migrated_count,
        errors,
        success: true,
    })
}

/// Returns the allocated `userId`, or `None` when the user already existed.
async fn copy_friend_to_user(store: &dyn UserStore, key: &PersonKey, age: i32) -> Result<Option<String>, AppError> {
    if store.find_user_by_key(key).await?.is_some() {
        return Ok(None);
    }

    let user_id = store.next_user_id().await?;
    let user = User::new(
        user_id,
        key.first_name.clone(),
        key.last_name.clone(),
        key.email.clone(),
        age,
    );
    let saved = store.insert_user(user).await?;
    Ok(Some(saved.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use mongodb::bson::doc;

    async fn seed_users(store: &MemoryStore) {
        for (first, last, email, age) in [
            ("Jane", "Doe", "jane@example.com", 30),
            ("John", "Roe", "john@example.com", 41),
        ] {
            let user_id = store.next_user_id().await.unwrap();
            let user = User::new(user_id, first.into(), last.into(), email.into(), age);
            store.insert_user(user).await.unwrap();
        }
    }

    #[tokio::test]
    async fn users_to_friends_copies_with_lower_case_fields() {
        let store = MemoryStore::new();
        seed_users(&store).await;

        let report = migrate_users_to_friends(&store).await.unwrap();
        assert_eq!(report.total_users, 2);
        assert_eq!(report.migrated_count, 2);
        assert!(report.errors.is_empty());
        assert!(report.success);

        let friends = store.friends().await;
        assert_eq!(friends[0].document().get_str("firstname").unwrap(), "Jane");
        assert!(!friends[0].document().contains_key("userId"));
    }

    #[tokio::test]
    async fn friends_to_users_reports_missing_fields_and_continues() {
        let store = MemoryStore::new();
        store
            .seed_friend(FriendRecord::from_document(doc! {
                "firstname": "Ana", "lastname": "Lee", "email": "ana@example.com", "age": "27"
            }))
            .await;
        store
            .seed_friend(FriendRecord::from_document(doc! { "firstname": "NoEmail", "lastname": "X", "age": 20 }))
            .await;
        store
            .seed_friend(FriendRecord::from_document(doc! {
                "firstName": "Bo", "lastName": "Kim", "email": "bo@example.com", "age": "n/a"
            }))
            .await;

        let report = migrate_friends_to_users(&store).await.unwrap();

        assert_eq!(report.total_friends, 3);
        assert_eq!(report.migrated_count, 1);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("Missing required fields for friend: "));
        assert!(report.errors[1].starts_with("Error with friend "));

        let ana = store.find_user("user001").await.unwrap().unwrap();
        assert_eq!(ana.first_name, "Ana");
        assert_eq!(ana.age, crate::models::Age::from(27));
    }

    #[tokio::test]
    async fn round_trip_is_idempotent() {
        let store = MemoryStore::new();
        seed_users(&store).await;

        assert_eq!(migrate_users_to_friends(&store).await.unwrap().migrated_count, 2);
        assert_eq!(migrate_friends_to_users(&store).await.unwrap().migrated_count, 0);

        assert_eq!(migrate_users_to_friends(&store).await.unwrap().migrated_count, 0);
        assert_eq!(migrate_friends_to_users(&store).await.unwrap().migrated_count, 0);
        assert_eq!(store.count_users().await.unwrap(), 2);
        assert_eq!(store.friends().await.len(), 2);
    }

    #[tokio::test]
    async fn friends_restore_users_after_clear() {
        let store = MemoryStore::new();
        seed_users(&store).await;
        migrate_users_to_friends(&store).await.unwrap();

        store.clear_users().await.unwrap();
        let report = migrate_friends_to_users(&store).await.unwrap();

        assert_eq!(report.migrated_count, 2);
        assert!(store.find_user("user001").await.unwrap().is_some());
        assert!(store.find_user("user002").await.unwrap().is_some());
    }
}
