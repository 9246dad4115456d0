use crate::cli::commands::open_db;
use crate::cli::parser::{Commands, ServiceCmd};
use crate::config::Config;
use crate::core::generator::SessionGenerator;
use crate::core::services::ServiceLogic;
use crate::db::services::{get_service, list_instances};
use crate::errors::{AppError, AppResult};
use crate::models::recurrence::RecurrencePattern;
use crate::models::service::{
    InstanceOverrides, NewService, Service, ServiceChanges, ServiceKind,
};
use crate::ui::messages::{ask_confirmation, header, info, success};
use crate::utils::colors::{CYAN, GREY, RESET};
use crate::utils::date::{parse_date_arg, today};
use crate::utils::table::Table;
use crate::utils::time::{parse_optional_time, parse_time_arg};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Service { action } = cmd else {
        return Ok(());
    };

    let mut pool = open_db(cfg)?;

    match action {
        ServiceCmd::Add {
            name,
            start,
            end,
            location,
            description,
            date,
            weekly,
            monthly,
            anchor,
        } => {
            let kind = match date {
                Some(d) => {
                    if anchor.is_some() {
                        return Err(AppError::InvalidValue(
                            "--anchor only applies to --weekly or --monthly services".into(),
                        ));
                    }
                    ServiceKind::OneOff {
                        date: parse_date_arg(d)?,
                    }
                }
                None => {
                    let pattern = if *weekly {
                        RecurrencePattern::Weekly
                    } else if *monthly {
                        RecurrencePattern::Monthly
                    } else {
                        RecurrencePattern::None
                    };
                    let anchor = match anchor {
                        Some(a) => parse_date_arg(a)?,
                        None => today(),
                    };
                    ServiceKind::Template {
                        pattern,
                        anchor: Some(anchor),
                    }
                }
            };

            let new = NewService {
                name: name.trim().to_string(),
                start_time: parse_time_arg(start)?,
                end_time: parse_optional_time(end.as_ref())?,
                location: location.clone(),
                description: description.clone(),
                kind,
            };

            let svc = ServiceLogic::create(&mut pool, &new)?;
            success(format!(
                "Service #{} '{}' created ({})",
                svc.id,
                svc.name,
                kind_label(&svc)
            ));
            if svc.is_template() {
                info(format!(
                    "Run `rollcall service expand {}` to create its sessions.",
                    svc.id
                ));
            }
        }

        ServiceCmd::List { sessions } => {
            let services = match sessions {
                Some(tpl) => {
                    let template = get_service(&pool.conn, *tpl)?;
                    if !template.is_template() {
                        return Err(AppError::InvalidTemplate(*tpl));
                    }
                    header(format!("Sessions of '{}'", template.name));
                    list_instances(&pool.conn, *tpl)?
                }
                None => ServiceLogic::fetch_all(&pool)?,
            };

            if services.is_empty() {
                info("No services found.");
                return Ok(());
            }
            print!("{}", services_table(&services).render());
        }

        ServiceCmd::Show { id } => {
            let svc = get_service(&pool.conn, *id)?;
            print_service(&svc);
            if svc.is_template() {
                let n = list_instances(&pool.conn, svc.id)?.len();
                println!("{CYAN}Sessions:{RESET}    {n}");
            }
        }

        ServiceCmd::Update {
            id,
            name,
            start,
            end,
            location,
            description,
        } => {
            let changes = ServiceChanges {
                name: name.clone(),
                start_time: parse_optional_time(start.as_ref())?,
                end_time: parse_optional_time(end.as_ref())?,
                location: location.clone(),
                description: description.clone(),
            };

            let propagated = ServiceLogic::update(&mut pool, *id, &changes)?;
            if propagated > 0 {
                success(format!(
                    "Service #{id} updated, {propagated} session(s) updated with it."
                ));
            } else {
                success(format!("Service #{id} updated."));
            }
        }

        ServiceCmd::Del { id, yes } => {
            let svc = get_service(&pool.conn, *id)?;
            let prompt = if svc.is_template() {
                format!(
                    "Delete recurring service '{}' with all its sessions and attendance? \
                     This action is irreversible.",
                    svc.name
                )
            } else {
                format!(
                    "Delete '{}' ({}) and its attendance? This action is irreversible.",
                    svc.name,
                    svc.date_str()
                )
            };

            if !*yes && !ask_confirmation(&prompt) {
                info("Operation cancelled.");
                return Ok(());
            }

            ServiceLogic::delete(&mut pool, *id)?;
            success(format!("Service #{id} has been deleted."));
        }

        ServiceCmd::Expand {
            template_id,
            months,
            from,
        } => {
            let months = months.unwrap_or(cfg.default_horizon_months);
            let from = from.as_deref().map(parse_date_arg).transpose()?;
            let generated =
                SessionGenerator::generate_from(&mut pool, *template_id, months, today(), from)?;

            success(format!(
                "{} session(s) created, {} already existed.",
                generated.created,
                generated.instances.len() - generated.created
            ));
            if !generated.instances.is_empty() {
                print!("{}", services_table(&generated.instances).render());
            }
        }

        ServiceCmd::AddDate {
            template_id,
            date,
            location,
            start,
            end,
        } => {
            let overrides = InstanceOverrides {
                location: location.clone(),
                start_time: parse_optional_time(start.as_ref())?,
                end_time: parse_optional_time(end.as_ref())?,
            };
            let svc = SessionGenerator::add_instance(
                &mut pool,
                *template_id,
                parse_date_arg(date)?,
                &overrides,
            )?;
            success(format!(
                "Session #{} of '{}' added on {}",
                svc.id,
                svc.name,
                svc.date_str()
            ));
        }
    }

    Ok(())
}

fn kind_label(svc: &Service) -> String {
    match &svc.kind {
        ServiceKind::Template { pattern, .. } => format!("{} template", pattern.to_db_str()),
        ServiceKind::Instance { parent, .. } => format!("session of #{parent}"),
        ServiceKind::OneOff { .. } => "one-off".to_string(),
    }
}

fn services_table(services: &[Service]) -> Table {
    let mut table = Table::new(&["ID", "Date", "Time", "Name", "Kind", "Location"]);
    for s in services {
        let date_color = if s.is_template() { Some(GREY) } else { None };
        table.add_colored_row(vec![
            (s.id.to_string(), None),
            (s.date_str(), date_color),
            (s.time_range_str(), None),
            (s.name.clone(), None),
            (kind_label(s), None),
            (s.location.clone().unwrap_or_else(|| "--".into()), None),
        ]);
    }
    table
}

fn print_service(svc: &Service) {
    header(format!("#{} {}", svc.id, svc.name));
    println!("{CYAN}Kind:{RESET}        {}", kind_label(svc));
    if let ServiceKind::Template {
        anchor: Some(anchor),
        ..
    } = &svc.kind
    {
        println!("{CYAN}Anchor:{RESET}      {anchor}");
    }
    println!("{CYAN}Date:{RESET}        {}", svc.date_str());
    println!("{CYAN}Time:{RESET}        {}", svc.time_range_str());
    println!(
        "{CYAN}Location:{RESET}    {}",
        svc.location.as_deref().unwrap_or("--")
    );
    if let Some(d) = &svc.description {
        println!("{CYAN}Description:{RESET} {d}");
    }
}
