use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "late" => Some(AttendanceStatus::Late),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

/// One row per (member, service); the store rejects a second one.
#[derive(Debug, Clone, Serialize)]
pub struct Attendance {
    pub id: i64,
    pub member_id: i64,
    pub member_code: String,
    pub member_name: String,
    pub service_id: i64,
    pub status: AttendanceStatus,
    pub check_in_time: Option<NaiveDateTime>, // None for absences
    pub is_auto_marked: bool,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Attendance {
    pub fn check_in_str(&self) -> String {
        self.check_in_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string())
    }
}
