use crate::cli::commands::open_db;
use crate::cli::parser::{Commands, MemberCmd};
use crate::config::Config;
use crate::core::members::{MemberLogic, NewMember};
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::colors::GREY;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Member { action } = cmd else {
        return Ok(());
    };

    let mut pool = open_db(cfg)?;

    match action {
        MemberCmd::Add {
            code,
            name,
            email,
            phone,
            visitor,
        } => {
            let m = MemberLogic::add(
                &mut pool,
                &NewMember {
                    code: code.clone(),
                    full_name: name.clone(),
                    email: email.clone(),
                    phone: phone.clone(),
                    is_visitor: *visitor,
                },
            )?;
            let what = if m.is_visitor { "Visitor" } else { "Member" };
            success(format!("{what} {} ({}) added", m.full_name, m.code));
        }

        MemberCmd::List => {
            let members = MemberLogic::list(&pool)?;
            if members.is_empty() {
                info("No members registered.");
                return Ok(());
            }

            let mut table = Table::new(&["Code", "Name", "Email", "Phone", "Type"]);
            for m in &members {
                let (kind, color) = if m.is_visitor {
                    ("visitor", Some(GREY))
                } else {
                    ("member", None)
                };
                table.add_colored_row(vec![
                    (m.code.clone(), None),
                    (m.full_name.clone(), None),
                    (m.email.clone().unwrap_or_else(|| "--".into()), None),
                    (m.phone.clone().unwrap_or_else(|| "--".into()), None),
                    (kind.to_string(), color),
                ]);
            }
            print!("{}", table.render());
        }
    }

    Ok(())
}
