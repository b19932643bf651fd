#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use pindo_core::accounts::create_user;
use pindo_core::moderation::create_meme;
use pindo_db::Database;
use pindo_types::{NewMeme, NewUser};

/// File-backed database in the temp dir, removed on drop.
pub struct TempDb {
    pub db: Database,
    path: PathBuf,
}

impl TempDb {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "pindo_test_{}_{}.db",
            name,
            std::process::id()
        ));
        remove_files(&path);
        let db = Database::open(&path).expect("open temp db");
        Self { db, path }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        remove_files(&self.path);
    }
}

fn remove_files(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut p = path.clone().into_os_string();
        p.push(suffix);
        let _ = fs::remove_file(p);
    }
}

pub fn add_users(db: &Database, count: usize) -> Vec<i64> {
    (1..=count)
        .map(|i| {
            let user = NewUser {
                username: format!("user{}", i),
                ..Default::default()
            };
            create_user(db, &user, "password").unwrap().id
        })
        .collect()
}

pub fn add_memes(db: &Database, author: i64, count: usize) -> Vec<i64> {
    (1..=count)
        .map(|i| {
            let meme = NewMeme {
                title: format!("meme {}", i),
            };
            create_meme(db, &meme, author).unwrap().id
        })
        .collect()
}

pub fn vote_rows(db: &Database) -> i64 {
    db.with_conn(|conn| {
        Ok::<_, anyhow::Error>(conn.query_row("SELECT COUNT(*) FROM votes", [], |r| r.get(0))?)
    })
    .unwrap()
}
