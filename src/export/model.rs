use crate::models::attendance::Attendance;
use crate::models::service::Service;
use serde::Serialize;

/// One flat CSV line per attendance row.
#[derive(Serialize, Clone, Debug)]
pub struct AttendanceExport {
    pub service_id: i64,
    pub service: String,
    pub date: String,
    pub member_code: String,
    pub member_name: String,
    pub status: String,
    pub check_in_time: String,
    pub auto_marked: bool,
}

impl AttendanceExport {
    pub fn from_row(service: &Service, a: &Attendance) -> Self {
        Self {
            service_id: service.id,
            service: service.name.clone(),
            date: service.date_str(),
            member_code: a.member_code.clone(),
            member_name: a.member_name.clone(),
            status: a.status.to_db_str().to_string(),
            check_in_time: a
                .check_in_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            auto_marked: a.is_auto_marked,
        }
    }
}
