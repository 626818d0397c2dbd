//! Command handlers.

pub mod compute;
pub mod history;
pub mod rules;

use repartition_db::queries::settings;
use repartition_types::Amount;
use rusqlite::Connection;

use crate::config::Config;

/// State shared by every command.
pub struct Context {
    pub conn: Connection,
    pub config: Config,
}

impl Context {
    /// Verification tolerance: config override, then stored setting.
    pub fn tolerance(&self) -> anyhow::Result<Amount> {
        match self.config.verification.tolerance {
            Some(t) => Ok(Amount::try_from(t)?),
            None => Ok(settings::tolerance(&self.conn)?),
        }
    }

    /// Whether unverified distributions may be stored.
    pub fn persist_unverified(&self) -> anyhow::Result<bool> {
        match self.config.verification.persist_unverified {
            Some(flag) => Ok(flag),
            None => Ok(settings::persist_unverified(&self.conn)?),
        }
    }
}

/// Current Unix time in seconds.
pub fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
pub(crate) fn test_context(config: Config) -> Context {
    Context {
        conn: repartition_db::open_memory().expect("open test db"),
        config,
    }
}
