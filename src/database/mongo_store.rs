use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;

use super::{MongoDB, UserStore};
use crate::models::{
    format_user_id, parse_user_id_seq, FriendRecord, PersonKey, UpdateUserRequest, User, UserFilter,
    FRIENDS_COLLECTION, USERS_COLLECTION,
};
use crate::utils::AppError;

const COUNTERS_COLLECTION: &str = "counters";
const USER_ID_COUNTER: &str = "userId";

/// `$or` over first/last name, matching the search term literally and
/// case-insensitively anywhere in the field.
pub(crate) fn search_filter(search: Option<&str>) -> Document {
    match search.filter(|s| !s.is_empty()) {
        Some(term) => {
            let pattern = regex::escape(term);
            doc! {
                "$or": [
                    { "firstName": { "$regex": &pattern, "$options": "i" } },
                    { "lastName": { "$regex": &pattern, "$options": "i" } },
                ]
            }
        }
        None => doc! {},
    }
}

fn read_seq(counter: &Document) -> Option<i64> {
    match counter.get("seq")? {
        Bson::Int32(n) => Some(*n as i64),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) => Some(*n as i64),
        _ => None,
    }
}

impl MongoDB {
    /// Raises the counter to the highest `userNNN` suffix already stored, so
    /// data written before the counter existed never collides.
    pub(super) async fn sync_user_counter(&self) -> Result<(), AppError> {
        let users = self.collection::<Document>(USERS_COLLECTION);
        let mut cursor = users.find(doc! {}).projection(doc! { "userId": 1 }).await?;

        let mut max_seq: i64 = 0;
        while let Some(user) = cursor.try_next().await? {
            if let Some(seq) = user.get_str("userId").ok().and_then(parse_user_id_seq) {
                max_seq = max_seq.max(seq);
            }
        }

        self.collection::<Document>(COUNTERS_COLLECTION)
            .update_one(doc! { "_id": USER_ID_COUNTER }, doc! { "$max": { "seq": max_seq } })
            .upsert(true)
            .await?;

        log::info!("   ✅ userId counter synced (current: {})", format_user_id(max_seq));
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoDB {
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let users = self.collection::<User>(USERS_COLLECTION);

        let mut find = users.find(search_filter(filter.search.as_deref()));
        if let Some((field, order)) = &filter.sort {
            let mut sort = Document::new();
            sort.insert(field.as_str(), order.direction());
            find = find.sort(sort);
        }
        if let Some(limit) = filter.limit {
            find = find.limit(limit);
        }

        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let users = self.collection::<User>(USERS_COLLECTION);
        Ok(users.find_one(doc! { "userId": user_id }).await?)
    }

    async fn find_user_by_key(&self, key: &PersonKey) -> Result<Option<User>, AppError> {
        let users = self.collection::<User>(USERS_COLLECTION);
        Ok(users.find_one(key.user_filter()).await?)
    }

    async fn count_users(&self) -> Result<u64, AppError> {
        let users = self.collection::<User>(USERS_COLLECTION);
        Ok(users.count_documents(doc! {}).await?)
    }

    async fn insert_user(&self, mut user: User) -> Result<User, AppError> {
        self.prepare().await?;
        let users = self.collection::<User>(USERS_COLLECTION);
        let result = users.insert_one(&user).await?;
        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn update_user(&self, user_id: &str, changes: &UpdateUserRequest) -> Result<Option<User>, AppError> {
        let users = self.collection::<User>(USERS_COLLECTION);

        let mut set = doc! { "updatedAt": BsonDateTime::now() };
        if let Some(first_name) = &changes.first_name { set.insert("firstName", first_name); }
        if let Some(last_name) = &changes.last_name { set.insert("lastName", last_name); }
        if let Some(email) = &changes.email { set.insert("email", email); }
        if let Some(age) = changes.age { set.insert("age", age); }

        Ok(users
            .find_one_and_update(doc! { "userId": user_id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let users = self.collection::<User>(USERS_COLLECTION);
        Ok(users.find_one_and_delete(doc! { "userId": user_id }).await?)
    }

    async fn clear_users(&self) -> Result<u64, AppError> {
        let users = self.collection::<User>(USERS_COLLECTION);
        let result = users.delete_many(doc! {}).await?;

        self.collection::<Document>(COUNTERS_COLLECTION)
            .update_one(doc! { "_id": USER_ID_COUNTER }, doc! { "$set": { "seq": 0_i64 } })
            .upsert(true)
            .await?;

        Ok(result.deleted_count)
    }

    async fn next_user_id(&self) -> Result<String, AppError> {
        self.prepare().await?;
        let counters = self.collection::<Document>(COUNTERS_COLLECTION);
        let counter = counters
            .find_one_and_update(doc! { "_id": USER_ID_COUNTER }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        counter
            .as_ref()
            .and_then(read_seq)
            .map(format_user_id)
            .ok_or_else(|| AppError::Internal("userId counter returned no sequence".to_string()))
    }

    async fn list_friends(&self, limit: Option<i64>) -> Result<Vec<FriendRecord>, AppError> {
        let friends = self.collection::<Document>(FRIENDS_COLLECTION);

        let mut find = friends.find(doc! {});
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let docs: Vec<Document> = find.await?.try_collect().await?;
        Ok(docs.into_iter().map(FriendRecord::from_document).collect())
    }

    async fn find_friend_by_key(&self, key: &PersonKey) -> Result<Option<FriendRecord>, AppError> {
        let friends = self.collection::<Document>(FRIENDS_COLLECTION);
        Ok(friends
            .find_one(key.friend_filter())
            .await?
            .map(FriendRecord::from_document))
    }

    async fn insert_friend(&self, friend: FriendRecord) -> Result<(), AppError> {
        let friends = self.collection::<Document>(FRIENDS_COLLECTION);
        friends.insert_one(friend.into_document()).await?;
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self.db.list_collection_names().await?)
    }

    fn database_name(&self) -> String {
        self.db.name().to_string()
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
