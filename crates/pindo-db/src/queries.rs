use anyhow::Result;
use chrono::{DateTime, Utc};
use pindo_core::Records;
use pindo_types::{
    ApprovalDay, Group, ItemTally, Meme, NewMeme, NewUser, User, Vote, VoteDirection,
};
use rusqlite::{Connection, OptionalExtension, Row, params};

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, password_hash, password_salt, is_active, group_id";

const MEME_COLUMNS: &str = "id, title, author_id, is_approved, created_at, approved_at";

/// [`Records`] over a connection that already has a transaction open.
pub struct SqliteRecords<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRecords<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query_users(&self, filter: &str) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users {} ORDER BY id", USER_COLUMNS, filter);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl Records for SqliteRecords<'_> {
    // -- Users --

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [username], user_from_row)
            .optional()?;
        Ok(row)
    }

    fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let row = self.conn.query_row(&sql, [id], user_from_row).optional()?;
        Ok(row)
    }

    fn insert_user(
        &self,
        user: &NewUser,
        password_hash: &[u8],
        password_salt: &[u8],
        group_id: i64,
    ) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users (username, first_name, last_name, password_hash, password_salt, group_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.username,
                user.first_name,
                user.last_name,
                password_hash,
                password_salt,
                group_id
            ],
        )?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password_hash: password_hash.to_vec(),
            password_salt: password_salt.to_vec(),
            is_active: false,
            group_id,
        })
    }

    fn upsert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, username, first_name, last_name, password_hash, password_salt, is_active, group_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                password_hash = excluded.password_hash,
                password_salt = excluded.password_salt,
                is_active = excluded.is_active,
                group_id = excluded.group_id",
            params![
                user.id,
                user.username,
                user.first_name,
                user.last_name,
                user.password_hash,
                user.password_salt,
                user.is_active,
                user.group_id
            ],
        )?;
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(n > 0)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        self.query_users("")
    }

    fn list_inactive_users(&self) -> Result<Vec<User>> {
        self.query_users("WHERE is_active = 0")
    }

    // -- Groups --

    fn find_group_by_id(&self, id: i64) -> Result<Option<Group>> {
        let row = self
            .conn
            .query_row("SELECT id, name FROM groups WHERE id = ?1", [id], |row| {
                Ok(Group {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM groups ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Group {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // -- Votes --

    fn find_vote(&self, meme_id: i64, user_id: i64) -> Result<Option<Vote>> {
        let direction: Option<String> = self
            .conn
            .query_row(
                "SELECT direction FROM votes WHERE meme_id = ?1 AND user_id = ?2",
                [meme_id, user_id],
                |row| row.get(0),
            )
            .optional()?;

        match direction {
            Some(d) => Ok(Some(Vote {
                meme_id,
                user_id,
                direction: d.parse::<VoteDirection>()?,
            })),
            None => Ok(None),
        }
    }

    fn upsert_vote(&self, vote: &Vote) -> Result<()> {
        self.conn.execute(
            "INSERT INTO votes (meme_id, user_id, direction) VALUES (?1, ?2, ?3)
             ON CONFLICT(meme_id, user_id) DO UPDATE SET direction = excluded.direction",
            params![vote.meme_id, vote.user_id, vote.direction.as_str()],
        )?;
        Ok(())
    }

    fn delete_vote(&self, meme_id: i64, user_id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM votes WHERE meme_id = ?1 AND user_id = ?2",
            [meme_id, user_id],
        )?;
        Ok(())
    }

    fn count_votes(&self, meme_id: i64, direction: VoteDirection) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE meme_id = ?1 AND direction = ?2",
            params![meme_id, direction.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn tally_page(&self, after: Option<i64>, limit: usize) -> Result<Vec<ItemTally>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id,
                    COUNT(CASE WHEN v.direction = 'up' THEN 1 END),
                    COUNT(CASE WHEN v.direction = 'down' THEN 1 END)
             FROM memes m
             LEFT JOIN votes v ON v.meme_id = m.id
             WHERE m.is_approved = 1 AND (?1 IS NULL OR m.id > ?1)
             GROUP BY m.id
             ORDER BY m.id
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![after, limit as i64], |row| {
                Ok(ItemTally {
                    meme_id: row.get(0)?,
                    up: row.get(1)?,
                    down: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // -- Memes --

    fn find_meme(&self, id: i64) -> Result<Option<Meme>> {
        let sql = format!("SELECT {} FROM memes WHERE id = ?1", MEME_COLUMNS);
        let row = self.conn.query_row(&sql, [id], meme_from_row).optional()?;
        Ok(row)
    }

    fn insert_meme(
        &self,
        meme: &NewMeme,
        author_id: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Meme> {
        self.conn.execute(
            "INSERT INTO memes (title, author_id, created_at) VALUES (?1, ?2, ?3)",
            params![meme.title, author_id, created_at],
        )?;

        Ok(Meme {
            id: self.conn.last_insert_rowid(),
            title: meme.title.clone(),
            author_id,
            is_approved: false,
            created_at,
            approved_at: None,
        })
    }

    fn set_meme_approval(&self, id: i64, approved_at: Option<DateTime<Utc>>) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE memes SET is_approved = ?2, approved_at = ?3 WHERE id = ?1",
            params![id, approved_at.is_some(), approved_at],
        )?;
        Ok(n > 0)
    }

    fn list_memes(&self, approved: bool) -> Result<Vec<Meme>> {
        let sql = format!(
            "SELECT {} FROM memes WHERE is_approved = ?1 ORDER BY id",
            MEME_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([approved], meme_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn delete_meme(&self, id: i64) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM memes WHERE id = ?1", [id])?;
        Ok(n > 0)
    }

    fn approvals_by_day(&self) -> Result<Vec<ApprovalDay>> {
        let mut stmt = self.conn.prepare(
            "SELECT date(approved_at) AS day, COUNT(*)
             FROM memes
             WHERE is_approved = 1 AND approved_at IS NOT NULL
             GROUP BY day
             ORDER BY day",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ApprovalDay {
                    day: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        password_hash: row.get(4)?,
        password_salt: row.get(5)?,
        is_active: row.get(6)?,
        group_id: row.get(7)?,
    })
}

fn meme_from_row(row: &Row<'_>) -> rusqlite::Result<Meme> {
    Ok(Meme {
        id: row.get(0)?,
        title: row.get(1)?,
        author_id: row.get(2)?,
        is_approved: row.get(3)?,
        created_at: row.get(4)?,
        approved_at: row.get(5)?,
    })
}
