// Registros da coleção `friends`: sem schema, acessados apenas pelas migrações.

use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use thiserror::Error;

use super::{to_iso_string, User};

pub const FRIENDS_COLLECTION: &str = "friends";

/// A schema-less document from the `friends` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FriendRecord(Document);

/// De-duplication key shared by both migration directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonKey {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl PersonKey {
    pub fn of_user(user: &User) -> Self {
        PersonKey {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }

    /// Filter over the lower-case friend field names.
    pub fn friend_filter(&self) -> Document {
        doc! {
            "firstname": &self.first_name,
            "lastname": &self.last_name,
            "email": &self.email,
        }
    }

    /// Filter over the camelCase user field names.
    pub fn user_filter(&self) -> Document {
        doc! {
            "firstName": &self.first_name,
            "lastName": &self.last_name,
            "email": &self.email,
        }
    }
}

/// Fields extracted from a friend record, ready to become a [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendCandidate {
    pub key: PersonKey,
    pub age: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FriendConversionError {
    #[error("missing required fields")]
    MissingFields,
    #[error("invalid age: {0}")]
    InvalidAge(String),
}

impl FriendRecord {
    pub fn from_document(doc: Document) -> Self {
        FriendRecord(doc)
    }

    /// Builds a friend document from a user, with fresh timestamps.
    pub fn from_user(user: &User) -> Self {
        let now = BsonDateTime::now();
        FriendRecord(doc! {
            "firstname": &user.first_name,
            "lastname": &user.last_name,
            "email": &user.email,
            "age": user.age,
            "createdAt": now,
            "updatedAt": now,
        })
    }

    pub fn document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }

    pub fn key(&self) -> Option<PersonKey> {
        Some(PersonKey {
            first_name: self.text_field(&["firstname", "firstName"])?,
            last_name: self.text_field(&["lastname", "lastName"])?,
            email: self.text_field(&["email"])?,
        })
    }

    /// Reads the record as a user candidate. Either casing of the name fields
    /// is accepted; empty, zero or null values count as missing.
    pub fn to_candidate(&self) -> Result<FriendCandidate, FriendConversionError> {
        let key = self.key().ok_or(FriendConversionError::MissingFields)?;
        let age = match self.0.get("age") {
            None => return Err(FriendConversionError::MissingFields),
            Some(value) if is_falsy(value) => return Err(FriendConversionError::MissingFields),
            Some(value) => coerce_age(value)?,
        };
        Ok(FriendCandidate { key, age })
    }

    /// `_id` as text, for error messages.
    pub fn display_id(&self) -> String {
        match self.0.get("_id") {
            Some(Bson::ObjectId(oid)) => oid.to_hex(),
            Some(Bson::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "undefined".to_string(),
        }
    }

    /// Plain JSON view: ObjectIds as hex, datetimes as ISO strings.
    pub fn to_json(&self) -> serde_json::Value {
        plain_json(Bson::Document(self.0.clone()))
    }

    fn text_field(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| match self.0.get(*name)? {
            Bson::String(s) if !s.is_empty() => Some(s.clone()),
            Bson::Int32(n) if *n != 0 => Some(n.to_string()),
            Bson::Int64(n) if *n != 0 => Some(n.to_string()),
            Bson::Double(n) if *n != 0.0 && !n.is_nan() => Some(n.to_string()),
            _ => None,
        })
    }
}

fn plain_json(value: Bson) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(to_iso_string(dt)),
        Bson::Double(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
        Bson::Document(doc) => Value::Object(doc.into_iter().map(|(k, v)| (k, plain_json(v))).collect()),
        Bson::Array(items) => Value::Array(items.into_iter().map(plain_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn is_falsy(value: &Bson) -> bool {
    match value {
        Bson::Null | Bson::Undefined => true,
        Bson::Boolean(b) => !b,
        Bson::String(s) => s.is_empty(),
        Bson::Int32(n) => *n == 0,
        Bson::Int64(n) => *n == 0,
        Bson::Double(n) => *n == 0.0 || n.is_nan(),
        _ => false,
    }
}

fn coerce_age(value: &Bson) -> Result<i32, FriendConversionError> {
    let invalid = || FriendConversionError::InvalidAge(value.to_string());
    match value {
        Bson::Int32(n) => Ok(*n),
        Bson::Int64(n) => i32::try_from(*n).map_err(|_| invalid()),
        Bson::Double(n) if n.is_finite() => {
            let truncated = n.trunc();
            if truncated >= i32::MIN as f64 && truncated <= i32::MAX as f64 {
                Ok(truncated as i32)
            } else {
                Err(invalid())
            }
        }
        Bson::String(s) => parse_leading_int(s).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Parses an optional sign and the leading run of digits, ignoring leading
/// whitespace and any trailing text (`" 25 years"` -> 25).
fn parse_leading_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => ("-", &s[1..]),
        Some(b'+') => ("", &s[1..]),
        _ => ("", s),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    format!("{}{}", sign, digits).parse().ok()
}
