use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Seeded by the first migration; every account belongs to one of these.
pub const ADMIN_GROUP_ID: i64 = 1;
pub const USER_GROUP_ID: i64 = 2;

/// Group new accounts are placed in.
pub const DEFAULT_GROUP_ID: i64 = USER_GROUP_ID;

// -- Accounts --

/// A stored account. The credential fields are the raw HMAC digest and key,
/// never the plaintext, and are skipped when the record is serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password_hash: Vec<u8>,
    #[serde(skip)]
    pub password_salt: Vec<u8>,
    pub is_active: bool,
    pub group_id: i64,
}

/// Registration payload; the credential is derived separately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Profile fields an account owner may change.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

/// A user together with its group, looked up explicitly at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub user: User,
    pub group: Option<Group>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.user.group_id == ADMIN_GROUP_ID
    }
}

// -- Memes --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meme {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMeme {
    pub title: String,
}

// -- Reports --

/// Up/down counts of one approved meme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTally {
    pub meme_id: i64,
    pub up: i64,
    pub down: i64,
}

impl ItemTally {
    pub fn net(&self) -> i64 {
        self.up - self.down
    }
}

/// Number of memes approved on a calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDay {
    pub day: NaiveDate,
    pub count: i64,
}
