use crate::cli::commands::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checkin::ensure_check_in_target;
use crate::core::closer::{AbsenceCloser, ActiveMembers};
use crate::db::services::get_service;
use crate::errors::AppResult;
use crate::ui::messages::{ask_confirmation, info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Close { service_id, yes } = cmd {
        let mut pool = open_db(cfg)?;

        let svc = get_service(&pool.conn, *service_id)?;
        ensure_check_in_target(&svc)?;

        let prompt = format!(
            "Mark every member without a check-in as absent for '{}' ({})?",
            svc.name,
            svc.date_str()
        );
        if !*yes && !ask_confirmation(&prompt) {
            info("Operation cancelled.");
            return Ok(());
        }

        let summary = AbsenceCloser::close_session(&mut pool, *service_id, &ActiveMembers)?;
        success(summary.message);
    }

    Ok(())
}
