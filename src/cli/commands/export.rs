use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::export::{ExportLogic, ExportRequest};
use std::path::PathBuf;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        range,
        location,
        employee,
        force,
    } = cmd
    {
        let mut pool = super::open_pool(cfg)?;
        let request = ExportRequest {
            format: *format,
            file: PathBuf::from(file),
            range: range.clone(),
            location: *location,
            employee: employee.clone(),
            force: *force,
        };
        ExportLogic::export(&mut pool, &cfg.report_options(), &request)?;
    }

    Ok(())
}
