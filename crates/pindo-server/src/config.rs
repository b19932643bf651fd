use std::path::PathBuf;

use anyhow::{Context, Result, bail};

const DEFAULT_DB_PATH: &str = "pindogram.db";
const DEFAULT_REPORT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub admin: Option<AdminSeed>,
    pub report_page_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("PINDO_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.into());

        let report_page_size = match lookup("PINDO_REPORT_PAGE_SIZE") {
            Some(v) => v
                .parse()
                .with_context(|| format!("PINDO_REPORT_PAGE_SIZE is not a number: {:?}", v))?,
            None => DEFAULT_REPORT_PAGE_SIZE,
        };
        if report_page_size == 0 {
            bail!("PINDO_REPORT_PAGE_SIZE must be at least 1");
        }

        let admin = match lookup("PINDO_ADMIN_USERNAME").filter(|u| !u.trim().is_empty()) {
            Some(username) => {
                let password = lookup("PINDO_ADMIN_PASSWORD")
                    .filter(|p| !p.trim().is_empty())
                    .context("PINDO_ADMIN_PASSWORD is required when PINDO_ADMIN_USERNAME is set")?;
                Some(AdminSeed { username, password })
            }
            None => None,
        };

        Ok(Self {
            db_path: PathBuf::from(db_path),
            admin,
            report_page_size,
        })
    }
}
