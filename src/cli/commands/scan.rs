use crate::cli::commands::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::checkin::{LocalGateway, ensure_check_in_target};
use crate::core::closer::{AbsenceCloser, ActiveMembers, AutoCloseWatcher};
use crate::core::scanner::{ScanEvent, Scanner, ScannerState};
use crate::core::wedge::{KeyboardWedge, TextDecoder};
use crate::db::services::get_service;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{header, info, success, warning};
use crate::utils::date::now;
use std::thread;
use std::time::Instant;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Scan { service } = cmd else {
        return Ok(());
    };

    let mut pool = open_db(cfg)?;
    let target = get_service(&pool.conn, *service)?;
    ensure_check_in_target(&target)?;

    header(format!(
        "{} | {} | {}",
        target.name,
        target.date_str(),
        target.time_range_str()
    ));

    let settings = cfg.scanner_settings();
    let gateway = LocalGateway::new(&mut pool, cfg.late_policy());
    let device = KeyboardWedge::default();
    let mut scanner = Scanner::new(device, TextDecoder, gateway, target, settings);
    let mut watcher = AutoCloseWatcher::new(cfg.auto_close_grace());

    scanner.start(Instant::now())?;
    info("Scanner ready: scan a member badge (Ctrl+D to stop).");

    while scanner.state() == ScannerState::Active {
        if let Some(deadline) = scanner.next_deadline() {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }

        let event = scanner.advance(Instant::now());

        let target = scanner.target().clone();
        let closed = watcher.poll(&target, now(), |id| {
            AbsenceCloser::close_session(scanner.gateway_mut().pool(), id, &ActiveMembers)
        });
        if let Some(summary) = closed {
            info(format!("Service has ended. {}", summary.message));
        }

        match event {
            None | Some(ScanEvent::NoCode) => {}
            Some(ScanEvent::Suppressed(code)) => {
                tracing::debug!(code = %code, "Repeated scan ignored");
            }
            Some(ScanEvent::CheckedIn(resp)) => success(resp.message),
            Some(ScanEvent::AlreadyCheckedIn(resp)) => info(resp.message),
            Some(ScanEvent::Rejected { message, .. }) => warning(message),
            Some(ScanEvent::TimedOut) => info(format!(
                "No scan for {} seconds, scanner closed.",
                settings.inactivity_timeout.as_secs()
            )),
            // the input went away: end of session, not a failure
            Some(ScanEvent::Halted(AppError::DeviceError(msg))) => {
                warning(format!("Scanner stopped: {msg}"));
            }
            Some(ScanEvent::Halted(e)) => return Err(e),
        }
    }

    Ok(())
}
