use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub qr_token: Option<String>,
}

impl Location {
    /// Configured token, with an empty string treated as "not configured".
    pub fn token(&self) -> Option<&str> {
        self.qr_token.as_deref().filter(|t| !t.is_empty())
    }
}
