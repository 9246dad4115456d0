use super::recurrence::RecurrencePattern;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// What a `services` row is: a recurring template, a dated session spawned
/// from a template, or a stand-alone dated service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ServiceKind {
    Template {
        pattern: RecurrencePattern,
        anchor: Option<NaiveDate>,
    },
    Instance {
        parent: i64,
        date: NaiveDate,
    },
    #[serde(rename = "oneoff")]
    OneOff { date: NaiveDate },
}

impl ServiceKind {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ServiceKind::Template { .. } => "template",
            ServiceKind::Instance { .. } => "instance",
            ServiceKind::OneOff { .. } => "oneoff",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub kind: ServiceKind,
    pub created_at: String,
}

impl Service {
    pub fn is_template(&self) -> bool {
        matches!(self.kind, ServiceKind::Template { .. })
    }

    /// Calendar date of a session; templates have none.
    pub fn date(&self) -> Option<NaiveDate> {
        match self.kind {
            ServiceKind::Template { .. } => None,
            ServiceKind::Instance { date, .. } | ServiceKind::OneOff { date } => Some(date),
        }
    }

    pub fn parent_id(&self) -> Option<i64> {
        match self.kind {
            ServiceKind::Instance { parent, .. } => Some(parent),
            _ => None,
        }
    }

    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        self.date().map(|d| d.and_time(self.start_time))
    }

    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        match (self.date(), self.end_time) {
            (Some(d), Some(t)) => Some(d.and_time(t)),
            _ => None,
        }
    }

    pub fn date_str(&self) -> String {
        self.date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "--".to_string())
    }

    pub fn time_range_str(&self) -> String {
        match self.end_time {
            Some(end) => format!(
                "{} - {}",
                self.start_time.format("%H:%M"),
                end.format("%H:%M")
            ),
            None => self.start_time.format("%H:%M").to_string(),
        }
    }
}

/// Fields needed to create a service; `kind` decides which shape it takes.
#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub kind: ServiceKind,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ServiceChanges {
    pub name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl ServiceChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.location.is_none()
            && self.description.is_none()
    }
}

/// Per-date overrides accepted when a single session is added by hand.
#[derive(Debug, Clone, Default)]
pub struct InstanceOverrides {
    pub location: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(kind: ServiceKind, end: Option<NaiveTime>) -> Service {
        Service {
            id: 1,
            name: "Sunday Service".into(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: end,
            location: None,
            description: None,
            kind,
            created_at: String::new(),
        }
    }

    #[test]
    fn template_has_no_date_nor_window() {
        let t = session(
            ServiceKind::Template {
                pattern: RecurrencePattern::Weekly,
                anchor: NaiveDate::from_ymd_opt(2024, 1, 7),
            },
            NaiveTime::from_hms_opt(11, 0, 0),
        );
        assert!(t.is_template());
        assert_eq!(t.date(), None);
        assert_eq!(t.ends_at(), None);
        assert_eq!(t.date_str(), "--");
    }

    #[test]
    fn instance_window_combines_date_and_times() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        let s = session(
            ServiceKind::Instance { parent: 7, date },
            NaiveTime::from_hms_opt(11, 0, 0),
        );
        assert_eq!(s.parent_id(), Some(7));
        assert_eq!(s.starts_at(), date.and_hms_opt(9, 0, 0));
        assert_eq!(s.ends_at(), date.and_hms_opt(11, 0, 0));
        assert_eq!(s.time_range_str(), "09:00 - 11:00");
    }
}
