//! # Admin Commands
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (dispatch)
//! ├── migrate.rs  ◄─── Apply migrations for the URL's vendor
//! ├── seed.rs     ◄─── Demo data for a SQLite store
//! ├── refresh.rs  ◄─── Daily payment summary refresh
//! ├── count.rs    ◄─── Catalog / shift counts
//! ├── report.rs   ◄─── Shift report with expense totals
//! └── scan.rs     ◄─── Source reference scanner
//! ```
//!
//! Every command writes its result to `out` (stdout in the binary) and
//! logs progress through `tracing` (stderr). Read-only commands never
//! write to the database.

pub mod count;
pub mod migrate;
pub mod refresh;
pub mod report;
pub mod scan;
pub mod seed;

use std::io::Write;
use tracing::debug;

use crate::cli::Command;
use crate::config::AdminConfig;
use crate::error::AdminResult;

/// Runs one command.
pub async fn run(
    command: Command,
    config: &AdminConfig,
    json: bool,
    out: &mut dyn Write,
) -> AdminResult<()> {
    debug!(?command, "Running command");

    match command {
        Command::Migrate => migrate::run(config, out).await,
        Command::Seed => seed::run(config, json, out).await,
        Command::RefreshSummary => refresh::run(config, json, out).await,
        Command::Count => count::run(config, json, out).await,
        Command::ShiftReport { date } => report::run(config, date, json, out).await,
        Command::ScanRefs { symbol, root } => {
            let root = root.unwrap_or_else(|| config.scan_root.clone());
            scan::run(&root, &symbol, json, out)
        }
    }
}
