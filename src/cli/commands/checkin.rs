use crate::cli::commands::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checkin::CheckInLogic;
use crate::errors::AppResult;
use crate::models::attendance::AttendanceStatus;
use crate::ui::messages::{info, success, warning};
use crate::utils::date::{now, parse_datetime};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Checkin {
        identifier,
        service,
        at,
    } = cmd
    {
        let when = match at {
            Some(s) => parse_datetime(s)?,
            None => now(),
        };

        let mut pool = open_db(cfg)?;
        let outcome =
            CheckInLogic::check_in(&mut pool, identifier, *service, when, cfg.late_policy())?;

        if outcome.already_checked_in() {
            info(outcome.message());
            return Ok(());
        }

        let a = outcome.attendance();
        match a.status {
            AttendanceStatus::Late => {
                warning(format!("{} (late, {})", outcome.message(), a.check_in_str()))
            }
            _ => success(format!("{} at {}", outcome.message(), a.check_in_str())),
        }
    }

    Ok(())
}
