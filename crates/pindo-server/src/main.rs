mod config;

use anyhow::Result;
use tracing::{info, warn};

use pindo_core::accounts::{authenticate, create_user, make_admin, set_active};
use pindo_core::moderation::approvals_by_day;
use pindo_core::votes::aggregate_report;
use pindo_core::{Records, Store};
use pindo_db::Database;
use pindo_types::NewUser;

use crate::config::{AdminSeed, Config};

fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pindogram_seed=debug,pindo_db=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::open(&config.db_path)?;

    match &config.admin {
        Some(seed) => seed_admin(&db, seed)?,
        None => info!("PINDO_ADMIN_USERNAME not set, skipping admin bootstrap"),
    }

    log_report(&db, config.report_page_size)?;
    Ok(())
}

/// Make sure the configured admin account exists, is active and is in the
/// admin group.
fn seed_admin(db: &Database, seed: &AdminSeed) -> Result<()> {
    let account = match authenticate(db, &seed.username, &seed.password)? {
        Some(account) => account,
        None => {
            let taken = db.read(|records: &dyn Records| {
                Ok(records.find_user_by_username(&seed.username)?.is_some())
            })?;
            if taken {
                warn!(
                    "User {} exists with a different password, leaving it alone",
                    seed.username
                );
                return Ok(());
            }

            let user = NewUser {
                username: seed.username.clone(),
                ..Default::default()
            };
            let created = create_user(db, &user, &seed.password)?;
            info!("Created admin user {} (id {})", created.username, created.id);
            authenticate(db, &seed.username, &seed.password)?
                .ok_or_else(|| anyhow::anyhow!("freshly created admin cannot log in"))?
        }
    };

    if !account.user.is_active {
        set_active(db, account.user.id, true)?;
    }
    if !account.is_admin() {
        make_admin(db, account.user.id)?;
        info!("Granted admin group to {}", account.user.username);
    }
    Ok(())
}

fn log_report(db: &Database, page_size: usize) -> Result<()> {
    let report = aggregate_report(db, page_size)?;

    let mut items = 0usize;
    for tally in &report {
        let tally = tally?;
        info!(
            meme_id = tally.meme_id,
            net = tally.net(),
            "{}",
            serde_json::to_string(&tally)?
        );
        items += 1;
    }
    info!("Rating report: {} approved memes", items);

    for day in approvals_by_day(db)? {
        info!("Approved on {}: {}", day.day, day.count);
    }
    Ok(())
}
