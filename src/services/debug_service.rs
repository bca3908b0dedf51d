use serde::Serialize;

use crate::database::UserStore;
use crate::models::{UserFilter, UserResponse};
use crate::utils::AppError;

const SAMPLE_SIZE: i64 = 10;

/// Diagnostic view of both collections.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebugSnapshot {
    pub user_count: u64,
    pub users: Vec<UserResponse>,
    pub friends_count: usize,
    #[schema(value_type = Vec<Object>)]
    pub friends: Vec<serde_json::Value>,
    pub collections: Vec<String>,
    pub db_name: String,
}

pub async fn snapshot(store: &dyn UserStore) -> Result<DebugSnapshot, AppError> {
    let user_count = store.count_users().await?;
    let users = store
        .list_users(&UserFilter { limit: Some(SAMPLE_SIZE), ..Default::default() })
        .await?;
    let collections = store.collection_names().await?;

    // `friends` may not exist at all
    let friends = match store.list_friends(Some(SAMPLE_SIZE)).await {
        Ok(friends) => friends.iter().map(|f| f.to_json()).collect(),
        Err(e) => {
            log::warn!("⚠️  Could not read friends collection: {}", e);
            Vec::new()
        }
    };

    Ok(DebugSnapshot {
        user_count,
        users: users.into_iter().map(UserResponse::from).collect(),
        friends_count: friends.len(),
        friends,
        collections,
        db_name: store.database_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::models::{FriendRecord, User};
    use mongodb::bson::doc;

    #[tokio::test]
    async fn snapshot_samples_at_most_ten_documents() {
        let store = MemoryStore::new();
        for i in 0..12 {
            let user_id = store.next_user_id().await.unwrap();
            let user = User::new(user_id, format!("First{}", i), "Last".into(), "x@example.com".into(), 20 + i);
            store.insert_user(user).await.unwrap();
        }
        store
            .seed_friend(FriendRecord::from_document(doc! { "firstname": "Jane", "email": "jane@example.com" }))
            .await;

        let snap = snapshot(&store).await.unwrap();

        assert_eq!(snap.user_count, 12);
        assert_eq!(snap.users.len(), 10);
        assert_eq!(snap.friends_count, 1);
        assert_eq!(snap.friends[0]["firstname"], "Jane");
        assert_eq!(snap.db_name, "memory");
        assert!(snap.collections.contains(&"users".to_string()));
    }
}
