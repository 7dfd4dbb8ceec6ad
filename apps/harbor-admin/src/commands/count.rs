//! `count`: row counts for the catalog and shift tables.

use std::io::Write;

use harbor_db::diagnostics::Diagnostics;

use crate::config::AdminConfig;
use crate::error::AdminResult;

pub async fn run(config: &AdminConfig, json: bool, out: &mut dyn Write) -> AdminResult<()> {
    let diagnostics = Diagnostics::connect(&config.database_url, config.max_connections).await?;
    let counts = diagnostics.table_counts().await;
    diagnostics.close().await;
    let counts = counts?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &counts)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "products            {:>8}", counts.products)?;
    writeln!(out, "legacy variations   {:>8}", counts.legacy_variations)?;
    writeln!(out, "product units       {:>8}", counts.product_units)?;
    writeln!(
        out,
        "shifts              {:>8}  (open {}, closed {})",
        counts.shifts_total, counts.shifts_open, counts.shifts_closed
    )?;
    Ok(())
}
