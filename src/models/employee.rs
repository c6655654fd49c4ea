use super::role::Role;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Employee {
    pub id: String,             // ⇔ employees.id (principal identifier)
    pub name: String,           // ⇔ employees.name
    pub email: Option<String>,  // ⇔ employees.email
    pub role: Role,             // ⇔ employees.role
    pub is_active: bool,        // ⇔ employees.is_active (INT 0/1)
    pub locations: Vec<i64>,    // ⇔ employee_locations, assignment order
}

impl Employee {
    /// The first assigned location, if any.
    pub fn primary_location(&self) -> Option<i64> {
        self.locations.first().copied()
    }

    pub fn is_assigned_to(&self, location_id: i64) -> bool {
        self.locations.contains(&location_id)
    }

    /// Display name used when a record has been created without one.
    pub fn default_name(id: &str, email: Option<&str>) -> String {
        email
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(id)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_is_first_assignment() {
        let e = Employee {
            id: "u1".into(),
            name: "Ana".into(),
            email: None,
            role: Role::Cook,
            is_active: true,
            locations: vec![7, 3],
        };
        assert_eq!(e.primary_location(), Some(7));
        assert!(e.is_assigned_to(3));
        assert!(!e.is_assigned_to(4));
    }

    #[test]
    fn default_name_prefers_email_local_part() {
        assert_eq!(Employee::default_name("u1", Some("ana@bar.es")), "ana");
        assert_eq!(Employee::default_name("u1", Some("@bar.es")), "u1");
        assert_eq!(Employee::default_name("u1", None), "u1");
    }
}
