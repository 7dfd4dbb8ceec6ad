//! `seed`: demo data for a fresh SQLite store.
//!
//! Seeding is skipped when the store already has outlets.

use serde::Serialize;
use std::io::Write;
use tracing::info;

use harbor_core::vendor::sqlite_path;
use harbor_core::DatabaseVendor;
use harbor_db::repository::batch::NewBatch;
use harbor_db::repository::product::NewProduct;
use harbor_db::{Database, DbConfig, DbResult};

use crate::config::AdminConfig;
use crate::error::{AdminError, AdminResult};

/// What one seeding run created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub outlets: usize,
    pub tills: usize,
    pub products: usize,
    pub units: usize,
    pub batches: usize,
}

struct DemoProduct {
    sku: &'static str,
    name: &'static str,
    base_unit: &'static str,
    price_cents: i64,
    tax_rate_bps: u32,
    /// (unit name, factor in thousandths, unit price override)
    unit: Option<(&'static str, i64, Option<i64>)>,
}

const CATALOG: &[DemoProduct] = &[
    DemoProduct {
        sku: "RICE-PISHORI",
        name: "Pishori Rice",
        base_unit: "kg",
        price_cents: 250,
        tax_rate_bps: 0,
        unit: Some(("sack", 25_000, Some(5_800))),
    },
    DemoProduct {
        sku: "SODA-330",
        name: "Soda 330ml",
        base_unit: "bottle",
        price_cents: 120,
        tax_rate_bps: 1600,
        unit: Some(("crate", 24_000, None)),
    },
    DemoProduct {
        sku: "SUGAR-1KG",
        name: "Sugar 1kg",
        base_unit: "packet",
        price_cents: 180,
        tax_rate_bps: 1600,
        unit: Some(("bale", 12_000, Some(2_050))),
    },
    DemoProduct {
        sku: "CHAI",
        name: "Masala Chai",
        base_unit: "cup",
        price_cents: 80,
        tax_rate_bps: 0,
        unit: None,
    },
];

pub async fn run(config: &AdminConfig, json: bool, out: &mut dyn Write) -> AdminResult<()> {
    let path = sqlite_path(&config.database_url).ok_or_else(|| AdminError::UnsupportedDatabase {
        command: "seed".to_string(),
        vendor: DatabaseVendor::from_url(&config.database_url).to_string(),
    })?;

    let db = Database::new(DbConfig::new(path).max_connections(config.max_connections)).await?;
    let report = seed(&db).await;
    db.close().await;
    let report = report?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else if report == SeedReport::default() {
        writeln!(out, "Store already has outlets; nothing seeded")?;
    } else {
        writeln!(
            out,
            "Seeded {} outlet(s), {} till(s), {} product(s), {} unit(s), {} batch(es)",
            report.outlets, report.tills, report.products, report.units, report.batches
        )?;
    }
    Ok(())
}

/// Seeds `db` unless it already has outlets.
pub async fn seed(db: &Database) -> DbResult<SeedReport> {
    let mut report = SeedReport::default();
    if !db.outlets().list().await?.is_empty() {
        info!("Store already seeded");
        return Ok(report);
    }

    let outlets = [
        db.outlets().create("Harbour Front").await?,
        db.outlets().create("Old Town").await?,
    ];
    report.outlets = outlets.len();

    for outlet in &outlets {
        for name in ["Till 1", "Till 2"] {
            db.tills().create(&outlet.id, name).await?;
            report.tills += 1;
        }
    }

    for demo in CATALOG {
        let product = db
            .products()
            .create(NewProduct {
                sku: demo.sku.to_string(),
                name: demo.name.to_string(),
                base_unit: demo.base_unit.to_string(),
                price_cents: demo.price_cents,
                tax_rate_bps: demo.tax_rate_bps,
            })
            .await?;
        report.products += 1;

        if let Some((unit_name, factor_milli, unit_price)) = demo.unit {
            db.products()
                .add_unit(&product.id, unit_name, factor_milli, unit_price)
                .await?;
            report.units += 1;
        }

        // Same lot number at both outlets: batch numbers are per outlet
        for outlet in &outlets {
            db.batches()
                .receive(NewBatch {
                    product_id: product.id.clone(),
                    outlet_id: outlet.id.clone(),
                    batch_number: "LOT-2026-01".to_string(),
                    quantity: 200,
                    cost_cents: Some(demo.price_cents * 7 / 10),
                    expiry_date: None,
                })
                .await?;
            report.batches += 1;
        }
    }

    info!(
        outlets = report.outlets,
        products = report.products,
        batches = report.batches,
        "Demo data seeded"
    );
    Ok(report)
}
