use serde::Serialize;

/// Job titles an employee can hold. The set is closed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub enum Role {
    HeadChef,
    Cook,
    Waiter,
    ShiftManager,
    #[default]
    Other,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::HeadChef,
        Role::Cook,
        Role::Waiter,
        Role::ShiftManager,
        Role::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Role::HeadChef => "Head chef",
            Role::Cook => "Cook",
            Role::Waiter => "Waiter",
            Role::ShiftManager => "Shift manager",
            Role::Other => "Other",
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::HeadChef => "head_chef",
            Role::Cook => "cook",
            Role::Waiter => "waiter",
            Role::ShiftManager => "shift_manager",
            Role::Other => "other",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|r| r.to_db_str() == s)
    }

    /// Helper: accept the DB code or the label, any case, `-` or ` ` for `_`.
    pub fn from_code(code: &str) -> Option<Self> {
        let norm = code.trim().to_lowercase().replace([' ', '-'], "_");
        Role::from_db_str(&norm)
    }
}
