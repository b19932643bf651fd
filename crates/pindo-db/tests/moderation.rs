mod common;

use chrono::Utc;
use pindo_core::Error;
use pindo_core::moderation::{
    approvals_by_day, approve, author_of, get_approved, get_unapproved, list_approved,
    list_unapproved, unapprove,
};
use pindo_db::Database;

use common::{add_memes, add_users};

#[test]
fn approve_and_withdraw() {
    let db = Database::open_in_memory().unwrap();
    let users = add_users(&db, 1);
    let memes = add_memes(&db, users[0], 3);

    assert_eq!(list_unapproved(&db).unwrap().len(), 3);
    assert!(matches!(get_approved(&db, memes[0]), Err(Error::NotFound(_))));

    let approved = approve(&db, memes[0]).unwrap();
    assert!(approved.is_approved);
    assert_eq!(get_approved(&db, memes[0]).unwrap(), approved);
    assert_eq!(list_approved(&db).unwrap().len(), 1);
    assert_eq!(list_unapproved(&db).unwrap().len(), 2);

    let withdrawn = unapprove(&db, memes[0]).unwrap();
    assert!(!withdrawn.is_approved);
    assert!(withdrawn.approved_at.is_none());
    assert_eq!(get_unapproved(&db, memes[0]).unwrap(), withdrawn);
}

#[test]
fn author_lookup() {
    let db = Database::open_in_memory().unwrap();
    let users = add_users(&db, 2);
    let meme = add_memes(&db, users[1], 1)[0];

    assert_eq!(author_of(&db, meme).unwrap().id, users[1]);
    assert!(matches!(author_of(&db, meme + 10), Err(Error::NotFound(_))));
    assert!(matches!(approve(&db, 42), Err(Error::NotFound(_))));
    assert!(matches!(unapprove(&db, 42), Err(Error::NotFound(_))));
}

#[test]
fn approvals_counted_per_day() {
    let db = Database::open_in_memory().unwrap();
    let users = add_users(&db, 1);
    let memes = add_memes(&db, users[0], 4);
    for meme in &memes[..3] {
        approve(&db, *meme).unwrap();
    }

    let days = approvals_by_day(&db).unwrap();
    assert_eq!(days.iter().map(|d| d.count).sum::<i64>(), 3);
    assert!(days.iter().any(|d| d.day == Utc::now().date_naive()));
}
