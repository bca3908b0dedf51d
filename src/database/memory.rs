// In-memory `UserStore` for tests. Mirrors the MongoDB semantics the service
// relies on: unique `userId`, literal case-insensitive search, field sorting,
// atomic id sequence reset by `clear_users`.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::Mutex;

use super::UserStore;
use crate::models::{
    format_user_id, FriendRecord, PersonKey, SortOrder, UpdateUserRequest, User, UserFilter,
    FRIENDS_COLLECTION, USERS_COLLECTION,
};
use crate::utils::AppError;

#[derive(Default)]
struct State {
    users: Vec<User>,
    friends: Vec<FriendRecord>,
    seq: i64,
}

/// Collection reads that can be switched to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// `list_users` and `count_users`
    Users,
    /// `list_friends`
    Friends,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    users_down: AtomicBool,
    friends_down: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, failure: Failure) {
        self.flag(failure).store(true, AtomicOrdering::SeqCst);
    }

    fn flag(&self, failure: Failure) -> &AtomicBool {
        match failure {
            Failure::Users => &self.users_down,
            Failure::Friends => &self.friends_down,
        }
    }

    fn check(&self, failure: Failure) -> Result<(), AppError> {
        if !self.flag(failure).load(AtomicOrdering::SeqCst) {
            return Ok(());
        }
        let collection = match failure {
            Failure::Users => USERS_COLLECTION,
            Failure::Friends => FRIENDS_COLLECTION,
        };
        Err(AppError::Internal(format!("{} collection unavailable", collection)))
    }

    pub async fn seed_friend(&self, friend: FriendRecord) {
        let mut doc = friend.into_document();
        if !doc.contains_key("_id") {
            doc.insert("_id", ObjectId::new());
        }
        self.state.lock().await.friends.push(FriendRecord::from_document(doc));
    }

    pub async fn friends(&self) -> Vec<FriendRecord> {
        self.state.lock().await.friends.clone()
    }
}

fn matches_search(user: &User, search: &str) -> bool {
    let needle = search.to_lowercase();
    user.first_name.to_lowercase().contains(&needle) || user.last_name.to_lowercase().contains(&needle)
}

/// Unknown fields compare equal, like sorting on a field no document has.
fn compare_field(a: &User, b: &User, field: &str) -> Ordering {
    match field {
        "userId" => a.user_id.cmp(&b.user_id),
        "firstName" => a.first_name.cmp(&b.first_name),
        "lastName" => a.last_name.cmp(&b.last_name),
        "email" => a.email.cmp(&b.email),
        "age" => a.age.partial_cmp(&b.age).unwrap_or(Ordering::Equal),
        "createdAt" => a.created_at.cmp(&b.created_at),
        "updatedAt" => a.updated_at.cmp(&b.updated_at),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        self.check(Failure::Users)?;
        let state = self.state.lock().await;
        let mut users: Vec<User> = state
            .users
            .iter()
            .filter(|u| filter.search.as_deref().map_or(true, |s| matches_search(u, s)))
            .cloned()
            .collect();

        if let Some((field, order)) = &filter.sort {
            users.sort_by(|a, b| {
                let ord = compare_field(a, b, field);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = filter.limit {
            users.truncate(limit.max(0) as usize);
        }
        Ok(users)
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_user_by_key(&self, key: &PersonKey) -> Result<Option<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| &PersonKey::of_user(u) == key).cloned())
    }

    async fn count_users(&self) -> Result<u64, AppError> {
        self.check(Failure::Users)?;
        Ok(self.state.lock().await.users.len() as u64)
    }

    async fn insert_user(&self, mut user: User) -> Result<User, AppError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.user_id == user.user_id) {
            return Err(AppError::Conflict(format!("Duplicate key: {}", user.user_id)));
        }
        user.id = Some(ObjectId::new());
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user_id: &str, changes: &UpdateUserRequest) -> Result<Option<User>, AppError> {
        let mut state = self.state.lock().await;
        Ok(state.users.iter_mut().find(|u| u.user_id == user_id).map(|user| {
            changes.apply_to(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let mut state = self.state.lock().await;
        let position = state.users.iter().position(|u| u.user_id == user_id);
        Ok(position.map(|i| state.users.remove(i)))
    }

    async fn clear_users(&self) -> Result<u64, AppError> {
        let mut state = self.state.lock().await;
        let removed = state.users.len() as u64;
        state.users.clear();
        state.seq = 0;
        Ok(removed)
    }

    async fn next_user_id(&self) -> Result<String, AppError> {
        let mut state = self.state.lock().await;
        state.seq += 1;
        Ok(format_user_id(state.seq))
    }

    async fn list_friends(&self, limit: Option<i64>) -> Result<Vec<FriendRecord>, AppError> {
        self.check(Failure::Friends)?;
        let state = self.state.lock().await;
        let take = limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(state.friends.iter().take(take).cloned().collect())
    }

    async fn find_friend_by_key(&self, key: &PersonKey) -> Result<Option<FriendRecord>, AppError> {
        let filter = key.friend_filter();
        let state = self.state.lock().await;
        Ok(state
            .friends
            .iter()
            .find(|f| filter.iter().all(|(k, v)| f.document().get(k) == Some(v)))
            .cloned())
    }

    async fn insert_friend(&self, friend: FriendRecord) -> Result<(), AppError> {
        self.seed_friend(friend).await;
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        let mut names = Vec::new();
        if !state.users.is_empty() {
            names.push(USERS_COLLECTION.to_string());
        }
        if !state.friends.is_empty() {
            names.push(FRIENDS_COLLECTION.to_string());
        }
        Ok(names)
    }

    fn database_name(&self) -> String {
        "memory".to_string()
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, Bson};

    #[tokio::test]
    async fn friend_lookup_uses_lower_case_keys_only() {
        let store = MemoryStore::new();
        store
            .seed_friend(FriendRecord::from_document(doc! {
                "firstName": "Jane", "lastName": "Doe", "email": "jane@example.com", "age": 30
            }))
            .await;

        let key = PersonKey {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
        };
        assert!(store.find_friend_by_key(&key).await.unwrap().is_none());

        store
            .seed_friend(FriendRecord::from_document(doc! {
                "firstname": "Jane", "lastname": "Doe", "email": "jane@example.com", "age": 30
            }))
            .await;
        let found = store.find_friend_by_key(&key).await.unwrap().unwrap();
        assert!(matches!(found.document().get("_id"), Some(Bson::ObjectId(_))));
    }

    #[tokio::test]
    async fn failure_switch_only_breaks_its_collection() {
        let store = MemoryStore::new();
        store.fail(Failure::Friends);

        assert!(store.list_friends(None).await.is_err());
        assert_eq!(store.count_users().await.unwrap(), 0);
    }
}
