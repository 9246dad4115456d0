use crate::core::report::ReportLogic;
use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::ui::messages::warning;
use std::path::Path;

pub struct ExportLogic;

impl ExportLogic {
    /// Write the attendance of `service_id` to `file`, which must be an
    /// absolute path. Existing files are only replaced with `force` or after
    /// confirmation.
    pub fn export(
        pool: &DbPool,
        service_id: i64,
        format: ExportFormat,
        file: &str,
        force: bool,
    ) -> AppResult<()> {
        let path = Path::new(file);

        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "Output file path must be absolute: {file}"
            )));
        }

        let report = ReportLogic::fetch_by_service(pool, service_id)?;
        if report.attendances.is_empty() {
            warning(format!(
                "No attendance recorded for {} ({}), nothing exported.",
                report.service.name,
                report.service.date_str()
            ));
            return Ok(());
        }

        ensure_writable(path, force)?;

        match format {
            ExportFormat::Csv => export_csv(&report, path)?,
            ExportFormat::Json => export_json(&report, path)?,
        }

        let msg = format!(
            "{} rows of service #{} as {}",
            report.total(),
            service_id,
            format.as_str()
        );
        if let Err(e) = audit(&pool.conn, "export", file, &msg) {
            tracing::warn!(error = %e, "Export not recorded in the internal log");
        }

        Ok(())
    }
}
