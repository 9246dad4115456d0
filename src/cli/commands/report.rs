use crate::cli::commands::open_db;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::report::{AttendanceReport, ReportLogic};
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::ui::messages::{header, info};
use crate::utils::colors::{GREEN, RED, RESET, YELLOW, color_for_status};
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Report {
        service_id,
        format,
        file,
        force,
    } = cmd
    {
        let pool = open_db(cfg)?;

        if let (Some(format), Some(file)) = (format, file) {
            return ExportLogic::export(&pool, *service_id, *format, file, *force);
        }

        let report = ReportLogic::fetch_by_service(&pool, *service_id)?;
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &AttendanceReport) {
    let svc = &report.service;
    header(format!(
        "{} | {} | {}",
        svc.name,
        svc.date_str(),
        svc.time_range_str()
    ));

    if report.attendances.is_empty() {
        info("No attendance recorded yet.");
        return;
    }

    let mut table = Table::new(&["Code", "Name", "Status", "Check-in", "Auto"]);
    for a in &report.attendances {
        table.add_colored_row(vec![
            (a.member_code.clone(), None),
            (a.member_name.clone(), None),
            (a.status.to_db_str().to_string(), Some(color_for_status(a.status))),
            (a.check_in_str(), None),
            ((if a.is_auto_marked { "yes" } else { "" }).to_string(), None),
        ]);
    }
    print!("{}", table.render());

    println!();
    println!(
        "Present: {GREEN}{}{RESET} | Late: {YELLOW}{}{RESET} | Absent: {RED}{}{RESET} | Total: {}",
        report.total_present,
        report.total_late,
        report.total_absent,
        report.total()
    );
    if let Some(pct) = report.turnout_percent() {
        println!("Turnout: {pct:.1}%");
    }
}
