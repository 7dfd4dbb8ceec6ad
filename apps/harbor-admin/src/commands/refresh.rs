//! `refresh-summary`: refresh the daily payment summary view.

use std::io::Write;

use harbor_core::DAILY_SUMMARY_VIEW;
use harbor_db::refresh_daily_summary;

use crate::config::AdminConfig;
use crate::error::AdminResult;

pub async fn run(config: &AdminConfig, json: bool, out: &mut dyn Write) -> AdminResult<()> {
    if !json {
        writeln!(out, "Refreshing {} ...", DAILY_SUMMARY_VIEW)?;
    }

    let outcome = refresh_daily_summary(&config.database_url, config.max_connections).await?;

    if json {
        serde_json::to_writer(&mut *out, &outcome)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}: {}", DAILY_SUMMARY_VIEW, outcome)?;
    }
    Ok(())
}
