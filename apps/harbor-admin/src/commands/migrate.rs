//! `migrate`: apply pending migrations for the configured database.

use std::io::Write;

use harbor_db::migrations::migrate_url;

use crate::config::AdminConfig;
use crate::error::AdminResult;

pub async fn run(config: &AdminConfig, out: &mut dyn Write) -> AdminResult<()> {
    let vendor = migrate_url(&config.database_url, config.max_connections).await?;
    writeln!(out, "Migrations applied ({})", vendor)?;
    Ok(())
}
