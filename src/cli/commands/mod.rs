pub mod backup;
pub mod checkin;
pub mod close;
pub mod config;
pub mod db;
pub mod init;
pub mod log;
pub mod member;
pub mod report;
pub mod scan;
pub mod service;

use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

/// Open the configured database, bringing its schema up to date first.
pub(crate) fn open_db(cfg: &Config) -> AppResult<DbPool> {
    let pool = DbPool::new(&cfg.database)?;
    init_db(&pool.conn)?;
    Ok(pool)
}
