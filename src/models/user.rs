use mongodb::bson::{oid::ObjectId, Bson, DateTime as BsonDateTime};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use validator::Validate;

pub const USERS_COLLECTION: &str = "users";

/// Usuário armazenado na coleção `users` (campos em camelCase)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Identificador público, gerado pelo servidor (`user001`, `user002`, ...)
    pub user_id: String,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Age,

    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl User {
    pub fn new(user_id: String, first_name: String, last_name: String, email: String, age: impl Into<Age>) -> Self {
        let now = BsonDateTime::now();
        User {
            id: None,
            user_id,
            first_name,
            last_name,
            email,
            age: age.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Largest integer a double represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Idade numérica. Aceita qualquer número (inteiro ou fracionário) e strings
/// numéricas como `"30"`; inteiros são gravados e devolvidos sem casa decimal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Age(f64);

impl Age {
    pub fn value(self) -> f64 {
        self.0
    }

    fn as_i64(self) -> Option<i64> {
        (self.0.fract() == 0.0 && self.0.abs() < MAX_SAFE_INTEGER).then(|| self.0 as i64)
    }
}

impl From<i32> for Age {
    fn from(n: i32) -> Self {
        Age(n as f64)
    }
}

impl From<f64> for Age {
    fn from(n: f64) -> Self {
        Age(n)
    }
}

impl From<Age> for Bson {
    fn from(age: Age) -> Self {
        match age.as_i64() {
            Some(n) => i32::try_from(n).map(Bson::Int32).unwrap_or(Bson::Int64(n)),
            None => Bson::Double(age.0),
        }
    }
}

impl Serialize for Age {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_i64() {
            Some(n) => match i32::try_from(n) {
                Ok(small) => serializer.serialize_i32(small),
                Err(_) => serializer.serialize_i64(n),
            },
            None => serializer.serialize_f64(self.0),
        }
    }
}

struct AgeVisitor;

impl AgeVisitor {
    fn finite<E: de::Error>(n: f64) -> Result<Age, E> {
        if n.is_finite() {
            Ok(Age(n))
        } else {
            Err(E::custom("age must be a finite number"))
        }
    }
}

impl<'de> Visitor<'de> for AgeVisitor {
    type Value = Age;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Age, E> {
        Ok(Age(if v { 1.0 } else { 0.0 }))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Age, E> {
        Ok(Age(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Age, E> {
        Ok(Age(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Age, E> {
        Self::finite(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Age, E> {
        let n: f64 = v
            .trim()
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))?;
        Self::finite(n)
    }
}

impl<'de> Deserialize<'de> for Age {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AgeVisitor)
    }
}

/// `toISOString()` rendering: UTC, millisecond precision, `Z` suffix.
pub fn to_iso_string(dt: BsonDateTime) -> String {
    chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
        .map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Formats a sequence number as a public user id, zero-padded to three digits.
pub fn format_user_id(seq: i64) -> String {
    format!("user{:03}", seq)
}

/// Inverse of [`format_user_id`]; `None` for ids outside the `userNNN` scheme.
pub fn parse_user_id_seq(user_id: &str) -> Option<i64> {
    let digits = user_id.strip_prefix("user")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Request para criar usuário
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "firstName is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "lastName is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[schema(value_type = f64)]
    pub age: Age,
}

/// Request para atualizar usuário (todos os campos opcionais)
#[derive(Debug, Default, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "firstName cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "lastName cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "email cannot be empty"))]
    pub email: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub age: Option<Age>,
    /// Must equal the id in the path when present; the public id never changes.
    pub user_id: Option<String>,
}

impl UpdateUserRequest {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name { user.first_name = first_name.clone(); }
        if let Some(last_name) = &self.last_name { user.last_name = last_name.clone(); }
        if let Some(email) = &self.email { user.email = email.clone(); }
        if let Some(age) = self.age { user.age = age; }
        user.updated_at = BsonDateTime::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only the literal `desc` sorts descending.
    pub fn from_param(order: Option<&str>) -> Self {
        match order {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// Query string de `GET /api/users`
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Field to sort by (e.g. `age`, `firstName`)
    pub sort: Option<String>,
    /// `desc` for descending, anything else ascending
    pub order: Option<String>,
    /// Case-insensitive substring matched against first and last name
    pub search: Option<String>,
}

/// Store-level listing criteria, already normalized from the query string.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<i64>,
}

impl From<ListUsersQuery> for UserFilter {
    fn from(q: ListUsersQuery) -> Self {
        let order = SortOrder::from_param(q.order.as_deref());
        UserFilter {
            search: q.search.filter(|s| !s.is_empty()),
            sort: q.sort.filter(|s| !s.is_empty()).map(|field| (field, order)),
            limit: None,
        }
    }
}

/// Response de usuário
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[schema(value_type = f64)]
    pub age: Age,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: u.user_id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            age: u.age,
            created_at: to_iso_string(u.created_at),
            updated_at: to_iso_string(u.updated_at),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DeleteUserResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
