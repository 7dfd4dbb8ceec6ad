//! `shift-report`: shifts with their expense totals.

use chrono::NaiveDate;
use std::io::Write;

use harbor_core::Money;
use harbor_db::diagnostics::Diagnostics;

use crate::config::AdminConfig;
use crate::error::AdminResult;

pub async fn run(
    config: &AdminConfig,
    date: Option<NaiveDate>,
    json: bool,
    out: &mut dyn Write,
) -> AdminResult<()> {
    let diagnostics = Diagnostics::connect(&config.database_url, config.max_connections).await?;
    let rows = diagnostics.shift_report(date).await;
    diagnostics.close().await;
    let rows = rows?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }

    if rows.is_empty() {
        match date {
            Some(date) => writeln!(out, "No shifts on {}", date)?,
            None => writeln!(out, "No shifts")?,
        }
        return Ok(());
    }

    writeln!(
        out,
        "{:<10}  {:<20}  {:<6}  {:>10}  {:>10}  {:>8}  {:>10}",
        "date", "cashier", "status", "float", "counted", "expenses", "spent"
    )?;
    for row in &rows {
        let counted = row
            .closing_cash_cents
            .map(|c| Money::from_cents(c).to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:<10}  {:<20}  {:<6}  {:>10}  {:>10}  {:>8}  {:>10}",
            row.operating_date,
            row.cashier_name,
            row.status,
            Money::from_cents(row.opening_float_cents).to_string(),
            counted,
            row.expense_count,
            Money::from_cents(row.expense_total_cents).to_string(),
        )?;
    }

    let spent: i64 = rows.iter().map(|r| r.expense_total_cents).sum();
    writeln!(
        out,
        "{} shift(s), {} spent",
        rows.len(),
        Money::from_cents(spent)
    )?;
    Ok(())
}
