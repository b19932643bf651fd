//! Vote ledger and rating queries.
//!
//! A user holds exactly one of three states per meme. Submitting a
//! direction toggles:
//!
//! | current | submitted | next    | ledger write      |
//! |---------|-----------|---------|-------------------|
//! | absent  | d         | d       | insert            |
//! | d       | d         | absent  | delete            |
//! | d       | opposite  | opposite| overwrite in place|

use pindo_types::{ItemTally, Vote, VoteDirection, VoteState};

use crate::store::Store;
use crate::{Error, Result};

/// The single ledger write a vote submission results in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Cast(VoteDirection),
    Retract,
    Flip(VoteDirection),
}

impl Transition {
    pub fn next(current: VoteState, submitted: VoteDirection) -> Self {
        match current.direction() {
            None => Transition::Cast(submitted),
            Some(held) if held == submitted => Transition::Retract,
            Some(held) => Transition::Flip(held.opposite()),
        }
    }

    pub fn resulting_state(self) -> VoteState {
        match self {
            Transition::Cast(d) | Transition::Flip(d) => VoteState::from(Some(d)),
            Transition::Retract => VoteState::Absent,
        }
    }
}

/// Apply a vote submission and return the user's new state.
///
/// Read, decide and write happen in one write unit, so concurrent
/// submissions for the same pair are applied one after another.
pub fn apply_vote<S: Store>(
    store: &S,
    meme_id: i64,
    user_id: i64,
    direction: VoteDirection,
) -> Result<VoteState> {
    store.write(|records| {
        if records.find_meme(meme_id)?.is_none() {
            return Err(Error::meme_not_found(meme_id));
        }
        if records.find_user_by_id(user_id)?.is_none() {
            return Err(Error::user_not_found(user_id));
        }

        let current = VoteState::from(records.find_vote(meme_id, user_id)?.map(|v| v.direction));
        let transition = Transition::next(current, direction);

        match transition {
            Transition::Cast(direction) | Transition::Flip(direction) => {
                records.upsert_vote(&Vote { meme_id, user_id, direction })?;
            }
            Transition::Retract => records.delete_vote(meme_id, user_id)?,
        }

        Ok(transition.resulting_state())
    })
}

/// [`apply_vote`] with the direction given as text ("up" / "down").
pub fn apply_vote_str<S: Store>(
    store: &S,
    meme_id: i64,
    user_id: i64,
    direction: &str,
) -> Result<VoteState> {
    let direction: VoteDirection = direction.parse()?;
    apply_vote(store, meme_id, user_id, direction)
}

pub fn upvote<S: Store>(store: &S, meme_id: i64, user_id: i64) -> Result<VoteState> {
    apply_vote(store, meme_id, user_id, VoteDirection::Up)
}

pub fn downvote<S: Store>(store: &S, meme_id: i64, user_id: i64) -> Result<VoteState> {
    apply_vote(store, meme_id, user_id, VoteDirection::Down)
}

/// Up votes minus down votes, recomputed on every call.
pub fn net_score<S: Store>(store: &S, meme_id: i64) -> Result<i64> {
    store.read(|records| {
        let up = records.count_votes(meme_id, VoteDirection::Up)?;
        let down = records.count_votes(meme_id, VoteDirection::Down)?;
        Ok(up - down)
    })
}

pub fn vote_state<S: Store>(store: &S, meme_id: i64, user_id: i64) -> Result<VoteState> {
    store.read(|records| {
        let vote = records.find_vote(meme_id, user_id)?;
        Ok(VoteState::from(vote.map(|v| v.direction)))
    })
}

pub fn is_active_up<S: Store>(store: &S, meme_id: i64, user_id: i64) -> Result<bool> {
    Ok(vote_state(store, meme_id, user_id)? == VoteState::Up)
}

pub fn is_active_down<S: Store>(store: &S, meme_id: i64, user_id: i64) -> Result<bool> {
    Ok(vote_state(store, meme_id, user_id)? == VoteState::Down)
}

// -- Reporting --

/// Per-meme up/down counts over all approved memes, ordered by meme id.
///
/// Nothing is read until the report is iterated. Each iteration starts
/// again from the lowest id and pulls `page_size` memes at a time.
pub fn aggregate_report<S: Store>(store: &S, page_size: usize) -> Result<AggregateReport<'_, S>> {
    if page_size == 0 {
        return Err(Error::InvalidInput("report page size must be positive".into()));
    }
    Ok(AggregateReport { store, page_size })
}

pub struct AggregateReport<'a, S> {
    store: &'a S,
    page_size: usize,
}

impl<'a, S: Store> AggregateReport<'a, S> {
    pub fn iter(&self) -> ReportIter<'a, S> {
        ReportIter {
            store: self.store,
            page_size: self.page_size,
            cursor: None,
            page: Vec::new().into_iter(),
            done: false,
        }
    }
}

impl<'a, S: Store> IntoIterator for &AggregateReport<'a, S> {
    type Item = Result<ItemTally>;
    type IntoIter = ReportIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ReportIter<'a, S> {
    store: &'a S,
    page_size: usize,
    cursor: Option<i64>,
    page: std::vec::IntoIter<ItemTally>,
    done: bool,
}

impl<S: Store> Iterator for ReportIter<'_, S> {
    type Item = Result<ItemTally>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(tally) = self.page.next() {
            self.cursor = Some(tally.meme_id);
            return Some(Ok(tally));
        }
        if self.done {
            return None;
        }

        let (cursor, limit) = (self.cursor, self.page_size);
        match self.store.read(|records| Ok(records.tally_page(cursor, limit)?)) {
            Ok(page) => {
                // A short page is the last one
                self.done = page.len() < limit;
                self.page = page.into_iter();
                let tally = self.page.next()?;
                self.cursor = Some(tally.meme_id);
                Some(Ok(tally))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
