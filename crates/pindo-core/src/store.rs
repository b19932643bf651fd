//! Persistence ports. `pindo-db` provides the SQLite implementation.

use chrono::{DateTime, Utc};
use pindo_types::{
    ApprovalDay, Group, ItemTally, Meme, NewMeme, NewUser, User, Vote, VoteDirection,
};

use crate::Result;

/// Record access available inside a read or write unit.
pub trait Records {
    // -- Users --

    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    fn find_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    fn insert_user(
        &self,
        user: &NewUser,
        password_hash: &[u8],
        password_salt: &[u8],
        group_id: i64,
    ) -> anyhow::Result<User>;
    /// Overwrites every mutable column of the row with `user.id`.
    fn upsert_user(&self, user: &User) -> anyhow::Result<()>;
    fn delete_user(&self, id: i64) -> anyhow::Result<bool>;
    fn list_users(&self) -> anyhow::Result<Vec<User>>;
    fn list_inactive_users(&self) -> anyhow::Result<Vec<User>>;

    // -- Groups --

    fn find_group_by_id(&self, id: i64) -> anyhow::Result<Option<Group>>;
    fn list_groups(&self) -> anyhow::Result<Vec<Group>>;

    // -- Votes --

    fn find_vote(&self, meme_id: i64, user_id: i64) -> anyhow::Result<Option<Vote>>;
    fn upsert_vote(&self, vote: &Vote) -> anyhow::Result<()>;
    fn delete_vote(&self, meme_id: i64, user_id: i64) -> anyhow::Result<()>;
    fn count_votes(&self, meme_id: i64, direction: VoteDirection) -> anyhow::Result<i64>;
    /// Up to `limit` approved memes with `id > after`, ascending by id.
    fn tally_page(&self, after: Option<i64>, limit: usize) -> anyhow::Result<Vec<ItemTally>>;

    // -- Memes --

    fn find_meme(&self, id: i64) -> anyhow::Result<Option<Meme>>;
    fn insert_meme(
        &self,
        meme: &NewMeme,
        author_id: i64,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<Meme>;
    /// `Some(ts)` approves at `ts`, `None` withdraws approval.
    fn set_meme_approval(&self, id: i64, approved_at: Option<DateTime<Utc>>)
    -> anyhow::Result<bool>;
    fn list_memes(&self, approved: bool) -> anyhow::Result<Vec<Meme>>;
    fn delete_meme(&self, id: i64) -> anyhow::Result<bool>;
    fn approvals_by_day(&self) -> anyhow::Result<Vec<ApprovalDay>>;
}

/// Unit-of-work boundary around [`Records`].
///
/// `write` must run its closure atomically and serialized against every
/// other write, committing only when the closure returns `Ok`. `read` must
/// present a single consistent snapshot.
pub trait Store: Send + Sync {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Records) -> Result<T>;

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Records) -> Result<T>;
}
