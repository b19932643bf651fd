use chrono::Utc;
use pindo_types::{ApprovalDay, Meme, NewMeme, User};

use crate::store::Store;
use crate::{Error, Result};

/// Submit a meme for moderation. It starts unapproved.
pub fn create_meme<S: Store>(store: &S, meme: &NewMeme, author_id: i64) -> Result<Meme> {
    if meme.title.trim().is_empty() {
        return Err(Error::InvalidInput("title is required".into()));
    }

    store.write(|records| {
        if records.find_user_by_id(author_id)?.is_none() {
            return Err(Error::user_not_found(author_id));
        }
        Ok(records.insert_meme(meme, author_id, Utc::now())?)
    })
}

pub fn approve<S: Store>(store: &S, id: i64) -> Result<Meme> {
    set_approval(store, id, true)
}

pub fn unapprove<S: Store>(store: &S, id: i64) -> Result<Meme> {
    set_approval(store, id, false)
}

fn set_approval<S: Store>(store: &S, id: i64, approved: bool) -> Result<Meme> {
    store.write(|records| {
        let approved_at = approved.then(Utc::now);
        if !records.set_meme_approval(id, approved_at)? {
            return Err(Error::meme_not_found(id));
        }
        records.find_meme(id)?.ok_or_else(|| Error::meme_not_found(id))
    })
}

pub fn list_approved<S: Store>(store: &S) -> Result<Vec<Meme>> {
    store.read(|records| Ok(records.list_memes(true)?))
}

pub fn list_unapproved<S: Store>(store: &S) -> Result<Vec<Meme>> {
    store.read(|records| Ok(records.list_memes(false)?))
}

/// Fetch a meme only if it is approved.
pub fn get_approved<S: Store>(store: &S, id: i64) -> Result<Meme> {
    get_in_state(store, id, true)
}

/// Fetch a meme only if it is still awaiting approval.
pub fn get_unapproved<S: Store>(store: &S, id: i64) -> Result<Meme> {
    get_in_state(store, id, false)
}

fn get_in_state<S: Store>(store: &S, id: i64, approved: bool) -> Result<Meme> {
    store.read(|records| {
        records
            .find_meme(id)?
            .filter(|m| m.is_approved == approved)
            .ok_or_else(|| Error::meme_not_found(id))
    })
}

pub fn author_of<S: Store>(store: &S, id: i64) -> Result<User> {
    store.read(|records| {
        let meme = records.find_meme(id)?.ok_or_else(|| Error::meme_not_found(id))?;
        records
            .find_user_by_id(meme.author_id)?
            .ok_or_else(|| Error::user_not_found(meme.author_id))
    })
}

/// Votes on the meme go with it. Deleting twice is fine.
pub fn delete_meme<S: Store>(store: &S, id: i64) -> Result<()> {
    store.write(|records| {
        records.delete_meme(id)?;
        Ok(())
    })
}

/// Approved meme counts grouped by UTC approval date.
pub fn approvals_by_day<S: Store>(store: &S) -> Result<Vec<ApprovalDay>> {
    store.read(|records| Ok(records.approvals_by_day()?))
}
