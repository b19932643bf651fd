use pindo_crypto::{hash_password, verify_password};
use pindo_types::{
    ADMIN_GROUP_ID, Account, DEFAULT_GROUP_ID, NewUser, USER_GROUP_ID, User, UserUpdate,
};

use crate::store::{Records, Store};
use crate::{Error, Result};

// -- Authentication --

/// Resolve `username`/`password` to an account.
///
/// Unknown usernames, wrong passwords and unusable stored credentials all
/// yield `Ok(None)` so a caller cannot tell them apart. Only storage
/// failures are returned as errors.
pub fn authenticate<S: Store>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<Option<Account>> {
    if username.is_empty() || password.is_empty() {
        return Ok(None);
    }

    store.read(|records| {
        let Some(user) = records.find_user_by_username(username)? else {
            return Ok(None);
        };

        match verify_password(password, &user.password_hash, &user.password_salt) {
            Ok(true) => {}
            Ok(false) | Err(_) => return Ok(None),
        }

        resolve_group(records, user).map(Some)
    })
}

// -- Registration and credentials --

/// Register a new, inactive account in the default group.
pub fn create_user<S: Store>(store: &S, user: &NewUser, password: &str) -> Result<User> {
    if password.trim().is_empty() {
        return Err(Error::Conflict("password is required".into()));
    }
    if user.username.trim().is_empty() {
        return Err(Error::InvalidInput("username is required".into()));
    }

    let credential = hash_password(password)?;

    store.write(|records| {
        if records.find_user_by_username(&user.username)?.is_some() {
            return Err(Error::Conflict(format!("username {} is already taken", user.username)));
        }

        let created = records.insert_user(
            user,
            &credential.hash,
            &credential.salt,
            DEFAULT_GROUP_ID,
        )?;
        Ok(created)
    })
}

/// Replace the stored credential. A blank password leaves it untouched.
pub fn change_password<S: Store>(store: &S, id: i64, new_password: &str) -> Result<()> {
    if new_password.trim().is_empty() {
        return Ok(());
    }

    let credential = hash_password(new_password)?;

    store.write(|records| {
        let mut user = records
            .find_user_by_id(id)?
            .ok_or_else(|| Error::user_not_found(id))?;
        user.password_hash = credential.hash;
        user.password_salt = credential.salt;
        records.upsert_user(&user)?;
        Ok(())
    })
}

/// Update profile fields and, when `password` is non-blank, the credential.
pub fn update_user<S: Store>(
    store: &S,
    update: &UserUpdate,
    password: Option<&str>,
) -> Result<User> {
    if update.username.trim().is_empty() {
        return Err(Error::InvalidInput("username is required".into()));
    }

    let credential = match password {
        Some(p) if !p.trim().is_empty() => Some(hash_password(p)?),
        _ => None,
    };

    store.write(|records| {
        let mut user = records
            .find_user_by_id(update.id)?
            .ok_or_else(|| Error::user_not_found(update.id))?;

        if update.username != user.username
            && records.find_user_by_username(&update.username)?.is_some()
        {
            return Err(Error::Conflict(format!(
                "username {} is already taken",
                update.username
            )));
        }

        user.username = update.username.clone();
        user.first_name = update.first_name.clone();
        user.last_name = update.last_name.clone();
        if let Some(credential) = credential {
            user.password_hash = credential.hash;
            user.password_salt = credential.salt;
        }

        records.upsert_user(&user)?;
        Ok(user)
    })
}

// -- Administration --

pub fn get_user<S: Store>(store: &S, id: i64) -> Result<Account> {
    store.read(|records| {
        let user = records
            .find_user_by_id(id)?
            .ok_or_else(|| Error::user_not_found(id))?;
        resolve_group(records, user)
    })
}

/// Every account with its group looked up in the same snapshot.
pub fn list_users<S: Store>(store: &S) -> Result<Vec<Account>> {
    store.read(|records| {
        let groups = records.list_groups()?;
        let accounts = records
            .list_users()?
            .into_iter()
            .map(|user| {
                let group = groups.iter().find(|g| g.id == user.group_id).cloned();
                Account { user, group }
            })
            .collect();
        Ok(accounts)
    })
}

pub fn list_inactive_users<S: Store>(store: &S) -> Result<Vec<User>> {
    store.read(|records| Ok(records.list_inactive_users()?))
}

pub fn set_active<S: Store>(store: &S, id: i64, active: bool) -> Result<User> {
    store.write(|records| {
        let mut user = records
            .find_user_by_id(id)?
            .ok_or_else(|| Error::user_not_found(id))?;
        user.is_active = active;
        records.upsert_user(&user)?;
        Ok(user)
    })
}

pub fn assign_group<S: Store>(store: &S, id: i64, group_id: i64) -> Result<Account> {
    store.write(|records| {
        let group = records
            .find_group_by_id(group_id)?
            .ok_or_else(|| Error::NotFound(format!("group {}", group_id)))?;
        let mut user = records
            .find_user_by_id(id)?
            .ok_or_else(|| Error::user_not_found(id))?;
        user.group_id = group.id;
        records.upsert_user(&user)?;
        Ok(Account { user, group: Some(group) })
    })
}

pub fn make_admin<S: Store>(store: &S, id: i64) -> Result<Account> {
    assign_group(store, id, ADMIN_GROUP_ID)
}

pub fn make_regular<S: Store>(store: &S, id: i64) -> Result<Account> {
    assign_group(store, id, USER_GROUP_ID)
}

/// Removing an account that does not exist is not an error.
pub fn delete_user<S: Store>(store: &S, id: i64) -> Result<()> {
    store.write(|records| {
        records.delete_user(id)?;
        Ok(())
    })
}

fn resolve_group(records: &dyn Records, user: User) -> Result<Account> {
    let group = records.find_group_by_id(user.group_id)?;
    Ok(Account { user, group })
}
