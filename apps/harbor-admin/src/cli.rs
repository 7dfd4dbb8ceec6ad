//! Command-line definition.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Harbor POS admin and reporting commands.
#[derive(Debug, Parser)]
#[command(name = "harbor-admin", version)]
pub struct Cli {
    /// Database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Apply pending migrations for the database's vendor
    Migrate,

    /// Populate a SQLite store with demo data
    Seed,

    /// Refresh the daily payment summary view (PostgreSQL only)
    RefreshSummary,

    /// Count products, legacy item variations, product units and shifts
    Count,

    /// List shifts with their expense totals
    ShiftReport {
        /// Only shifts for this operating date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Report files and lines that mention a symbol
    ScanRefs {
        /// Symbol to look for
        #[arg(default_value = "ItemVariation")]
        symbol: String,

        /// Directory to walk (overrides HARBOR_SCAN_ROOT)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}
