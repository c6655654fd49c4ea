use crate::cli::parser::EmployeeCmd;
use crate::config::Config;
use crate::core::employees::EmployeeLogic;
use crate::errors::{AppError, AppResult};
use crate::models::employee::Employee;
use crate::models::role::Role;
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{GREY, RESET};
use crate::utils::table::Table;
use chrono::Utc;

fn parse_role(raw: &str) -> AppResult<Role> {
    Role::from_code(raw).ok_or_else(|| AppError::InvalidRole(raw.to_string()))
}

fn print_roster(list: &[Employee]) {
    let mut t = Table::new(&["ID", "Name", "Role", "E-mail", "Locations", "Active"]);
    for e in list {
        let locations = e
            .locations
            .iter()
            .map(|l| format!("#{l}"))
            .collect::<Vec<_>>()
            .join(" ");
        let name = if e.is_active {
            e.name.clone()
        } else {
            format!("{GREY}{}{RESET}", e.name)
        };
        t.add_row(vec![
            e.id.clone(),
            name,
            e.role.label().to_string(),
            e.email.clone().unwrap_or_else(|| "-".into()),
            if locations.is_empty() { "any".into() } else { locations },
            if e.is_active { "yes".into() } else { "no".into() },
        ]);
    }
    print!("{}", t.render());
}

pub fn handle(cmd: &EmployeeCmd, cfg: &Config, actor: &str) -> AppResult<()> {
    let mut pool = super::open_pool(cfg)?;

    match cmd {
        EmployeeCmd::Add {
            id,
            name,
            email,
            role,
        } => {
            let role = parse_role(role)?;
            let e = EmployeeLogic::add(
                &mut pool,
                id,
                name.as_deref(),
                email.as_deref(),
                role,
                Utc::now(),
            )?;
            success(format!("Employee '{}' added ({}, {}).", e.id, e.name, e.role.label()));
        }

        EmployeeCmd::List { location } => {
            let list = EmployeeLogic::list(&pool.conn, *location)?;
            if list.is_empty() {
                info("No employees found.");
            } else {
                print_roster(&list);
            }
        }

        EmployeeCmd::Role { id, role } => {
            let e = EmployeeLogic::set_role(&mut pool, id, parse_role(role)?, actor)?;
            success(format!("'{}' is now {}.", e.id, e.role.label()));
        }

        EmployeeCmd::Activate { id } => {
            EmployeeLogic::set_active(&mut pool, id, true, actor)?;
            success(format!("Employee '{}' activated.", id));
        }

        EmployeeCmd::Deactivate { id } => {
            EmployeeLogic::set_active(&mut pool, id, false, actor)?;
            success(format!("Employee '{}' deactivated.", id));
        }

        EmployeeCmd::Assign { id, location } => {
            if EmployeeLogic::assign(&mut pool, id, *location, actor)? {
                success(format!("'{}' assigned to location #{}.", id, location));
            } else {
                info(format!("'{}' was already assigned to location #{}.", id, location));
            }
        }

        EmployeeCmd::Unassign { id, location } => {
            if EmployeeLogic::unassign(&mut pool, id, *location, actor)? {
                success(format!("'{}' removed from location #{}.", id, location));
            } else {
                warning(format!("'{}' was not assigned to location #{}.", id, location));
            }
        }

        EmployeeCmd::Del { id, yes } => {
            if !*yes && !super::ask_confirmation(&format!("Delete employee '{}'?", id)) {
                warning("Operation cancelled.");
                return Ok(());
            }
            EmployeeLogic::delete(&mut pool, id, actor)?;
            success(format!("Employee '{}' deleted.", id));
        }
    }

    Ok(())
}
