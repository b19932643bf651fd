//! In-process `Store` used by the unit tests in this crate.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use pindo_types::{
    ADMIN_GROUP_ID, ApprovalDay, Group, ItemTally, Meme, NewMeme, NewUser, USER_GROUP_ID, User,
    Vote, VoteDirection,
};

use crate::Result;
use crate::store::{Records, Store};

#[derive(Clone)]
struct State {
    users: BTreeMap<i64, User>,
    groups: Vec<Group>,
    memes: BTreeMap<i64, Meme>,
    votes: BTreeMap<(i64, i64), VoteDirection>,
    next_id: i64,
}

pub struct MemoryStore {
    state: Mutex<State>,
    fail_next_tally: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let groups = vec![
            Group { id: ADMIN_GROUP_ID, name: "admin".into() },
            Group { id: USER_GROUP_ID, name: "user".into() },
        ];
        Self {
            state: Mutex::new(State {
                users: BTreeMap::new(),
                groups,
                memes: BTreeMap::new(),
                votes: BTreeMap::new(),
                next_id: 1,
            }),
            fail_next_tally: AtomicBool::new(false),
        }
    }
}

impl MemoryStore {
    pub fn vote_rows(&self) -> usize {
        self.state.lock().unwrap().votes.len()
    }

    /// Makes the next `tally_page` call return an error.
    pub fn fail_next_tally(&self) {
        self.fail_next_tally.store(true, Ordering::SeqCst);
    }

    fn tx(&self, state: &State) -> Tx<'_> {
        Tx {
            state: RefCell::new(state.clone()),
            fail_tally: &self.fail_next_tally,
        }
    }
}

impl Store for MemoryStore {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Records) -> Result<T>,
    {
        let guard = self.state.lock().unwrap();
        f(&self.tx(&guard))
    }

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Records) -> Result<T>,
    {
        let mut guard = self.state.lock().unwrap();
        let tx = self.tx(&guard);
        let out = f(&tx)?;
        *guard = tx.state.into_inner();
        Ok(out)
    }
}

struct Tx<'a> {
    state: RefCell<State>,
    fail_tally: &'a AtomicBool,
}

impl Tx<'_> {
    fn next_id(&self) -> i64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        id
    }
}

impl Records for Tx<'_> {
    fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.state.borrow().users.values().find(|u| u.username == username).cloned())
    }

    fn find_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.state.borrow().users.get(&id).cloned())
    }

    fn insert_user(
        &self,
        user: &NewUser,
        password_hash: &[u8],
        password_salt: &[u8],
        group_id: i64,
    ) -> anyhow::Result<User> {
        let user = User {
            id: self.next_id(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password_hash: password_hash.to_vec(),
            password_salt: password_salt.to_vec(),
            is_active: false,
            group_id,
        };
        self.state.borrow_mut().users.insert(user.id, user.clone());
        Ok(user)
    }

    fn upsert_user(&self, user: &User) -> anyhow::Result<()> {
        self.state.borrow_mut().users.insert(user.id, user.clone());
        Ok(())
    }

    fn delete_user(&self, id: i64) -> anyhow::Result<bool> {
        let mut state = self.state.borrow_mut();
        let authored: Vec<i64> =
            state.memes.values().filter(|m| m.author_id == id).map(|m| m.id).collect();
        state.memes.retain(|_, m| m.author_id != id);
        state.votes.retain(|(meme, user), _| *user != id && !authored.contains(meme));
        Ok(state.users.remove(&id).is_some())
    }

    fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.state.borrow().users.values().cloned().collect())
    }

    fn list_inactive_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.state.borrow().users.values().filter(|u| !u.is_active).cloned().collect())
    }

    fn find_group_by_id(&self, id: i64) -> anyhow::Result<Option<Group>> {
        Ok(self.state.borrow().groups.iter().find(|g| g.id == id).cloned())
    }

    fn list_groups(&self) -> anyhow::Result<Vec<Group>> {
        Ok(self.state.borrow().groups.clone())
    }

    fn find_vote(&self, meme_id: i64, user_id: i64) -> anyhow::Result<Option<Vote>> {
        Ok(self.state.borrow().votes.get(&(meme_id, user_id)).map(|&direction| Vote {
            meme_id,
            user_id,
            direction,
        }))
    }

    fn upsert_vote(&self, vote: &Vote) -> anyhow::Result<()> {
        self.state.borrow_mut().votes.insert((vote.meme_id, vote.user_id), vote.direction);
        Ok(())
    }

    fn delete_vote(&self, meme_id: i64, user_id: i64) -> anyhow::Result<()> {
        self.state.borrow_mut().votes.remove(&(meme_id, user_id));
        Ok(())
    }

    fn count_votes(&self, meme_id: i64, direction: VoteDirection) -> anyhow::Result<i64> {
        let state = self.state.borrow();
        let count = state
            .votes
            .iter()
            .filter(|((meme, _), d)| *meme == meme_id && **d == direction)
            .count();
        Ok(count as i64)
    }

    fn tally_page(&self, after: Option<i64>, limit: usize) -> anyhow::Result<Vec<ItemTally>> {
        if self.fail_tally.swap(false, Ordering::SeqCst) {
            anyhow::bail!("tally query failed");
        }
        let state = self.state.borrow();
        let page = state
            .memes
            .values()
            .filter(|m| m.is_approved && after.is_none_or(|a| m.id > a))
            .take(limit)
            .map(|m| {
                let count = |d: VoteDirection| {
                    state
                        .votes
                        .iter()
                        .filter(|((meme, _), v)| *meme == m.id && **v == d)
                        .count() as i64
                };
                ItemTally {
                    meme_id: m.id,
                    up: count(VoteDirection::Up),
                    down: count(VoteDirection::Down),
                }
            })
            .collect();
        Ok(page)
    }

    fn find_meme(&self, id: i64) -> anyhow::Result<Option<Meme>> {
        Ok(self.state.borrow().memes.get(&id).cloned())
    }

    fn insert_meme(
        &self,
        meme: &NewMeme,
        author_id: i64,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<Meme> {
        let meme = Meme {
            id: self.next_id(),
            title: meme.title.clone(),
            author_id,
            is_approved: false,
            created_at,
            approved_at: None,
        };
        self.state.borrow_mut().memes.insert(meme.id, meme.clone());
        Ok(meme)
    }

    fn set_meme_approval(
        &self,
        id: i64,
        approved_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<bool> {
        let mut state = self.state.borrow_mut();
        let Some(meme) = state.memes.get_mut(&id) else {
            return Ok(false);
        };
        meme.is_approved = approved_at.is_some();
        meme.approved_at = approved_at;
        Ok(true)
    }

    fn list_memes(&self, approved: bool) -> anyhow::Result<Vec<Meme>> {
        let state = self.state.borrow();
        Ok(state.memes.values().filter(|m| m.is_approved == approved).cloned().collect())
    }

    fn delete_meme(&self, id: i64) -> anyhow::Result<bool> {
        let mut state = self.state.borrow_mut();
        state.votes.retain(|(meme, _), _| *meme != id);
        Ok(state.memes.remove(&id).is_some())
    }

    fn approvals_by_day(&self) -> anyhow::Result<Vec<ApprovalDay>> {
        let mut days: BTreeMap<_, i64> = BTreeMap::new();
        for at in self.state.borrow().memes.values().filter_map(|m| m.approved_at) {
            *days.entry(at.date_naive()).or_default() += 1;
        }
        Ok(days.into_iter().map(|(day, count)| ApprovalDay { day, count }).collect())
    }
}
