use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

pub const DEFAULT_MAX_HOURS: f64 = 12.0;

/// Singleton row `app_settings.id = 1`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppSettings {
    pub business_name: String,
    pub opening_time: NaiveTime,
    pub max_hours: f64,
    pub qr_token: Option<String>,
    pub selected_location_id: Option<i64>,
    /// Last-modified stamp; `None` until the row is first written.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            business_name: String::new(),
            opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            max_hours: DEFAULT_MAX_HOURS,
            qr_token: None,
            selected_location_id: None,
            updated_at: None,
        }
    }
}

impl AppSettings {
    pub fn token(&self) -> Option<&str> {
        self.qr_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub business_name: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub max_hours: Option<f64>,
    pub qr_token: Option<Option<String>>,
    pub selected_location_id: Option<Option<i64>>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.business_name.is_none()
            && self.opening_time.is_none()
            && self.max_hours.is_none()
            && self.qr_token.is_none()
            && self.selected_location_id.is_none()
    }

    pub fn apply(&self, s: &mut AppSettings) {
        if let Some(name) = &self.business_name {
            s.business_name = name.trim().to_string();
        }
        if let Some(t) = self.opening_time {
            s.opening_time = t;
        }
        if let Some(h) = self.max_hours {
            s.max_hours = h;
        }
        if let Some(tok) = &self.qr_token {
            s.qr_token = tok.clone().filter(|t| !t.is_empty());
        }
        if let Some(loc) = self.selected_location_id {
            s.selected_location_id = loc;
        }
    }
}
