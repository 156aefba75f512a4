//! Text and JSON rendering for command output

use crate::catalog::Catalog;
use crate::error::Result;
use crate::estimate::CostReport;
use crate::pricing::PriceTable;
use crate::recommend::Recommendations;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, Table};
use console::style;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn render_cost_report(report: &CostReport) -> String {
    let mut out = format!(
        "Pricing estimate for {} subscribers ({}, {} payer) in {}\n",
        report.subscriber_count,
        report.tolerance.as_str().to_uppercase(),
        report.payer_size,
        report.region
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Role", "VM SKU", "Servers", "Price/hr", "Monthly"]);

    for line in &report.lines {
        table.add_row(vec![
            Cell::new(&line.role),
            Cell::new(&line.vm_sku),
            Cell::new(line.server_count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", line.hourly_price)).set_alignment(CellAlignment::Right),
            Cell::new(money(line.monthly_cost)).set_alignment(CellAlignment::Right),
        ]);
    }
    for role in &report.unpriced {
        table.add_row(vec![
            Cell::new(&role.role),
            Cell::new(&role.vm_sku),
            Cell::new(role.server_count).set_alignment(CellAlignment::Right),
            Cell::new("n/a").fg(Color::Yellow),
            Cell::new("not priced").fg(Color::Yellow),
        ]);
    }

    out.push_str(&table.to_string());
    out.push('\n');

    if !report.pricing_complete {
        out.push_str(&format!(
            "{}\n",
            style("Warning: price list was only partially fetched").yellow()
        ));
    }
    for role in &report.unpriced {
        out.push_str(&format!(
            "{}\n",
            style(format!("Could not find price for {} ({})", role.role, role.vm_sku)).yellow()
        ));
    }

    out.push_str(&format!(
        "\nTOTAL ESTIMATED MONTHLY COST: {} ({} hours)\n",
        style(money(report.total_monthly_cost)).bold().green(),
        report.hours_in_month
    ));
    out
}

pub fn render_recommendations(subscriber_count: u64, recs: &Recommendations) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Role", "Workload", "VM SKU", "Servers"]);
    for (role, rec) in recs {
        table.add_row(vec![
            Cell::new(role),
            Cell::new(rec.workload_type),
            Cell::new(&rec.vm_sku),
            Cell::new(rec.server_count).set_alignment(CellAlignment::Right),
        ]);
    }
    format!("Recommendations for {} subscribers\n{}\n", subscriber_count, table)
}

pub fn render_prices(region: &str, prices: &PriceTable) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["SKU", "Price/hr"]);
    for (sku, price) in prices.iter() {
        table.add_row(vec![
            Cell::new(sku),
            Cell::new(format!("{:.4}", price)).set_alignment(CellAlignment::Right),
        ]);
    }
    format!("{} hourly prices in {}\n{}\n", prices.len(), region, table)
}

pub fn render_catalog(catalog: &Catalog) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Role", "Workload", "Servers", "Tolerance", "Small SKU", "Large SKU"]);
    for role in catalog.roles() {
        for (tolerance, tier) in &role.tiers {
            table.add_row(vec![
                Cell::new(&role.name),
                Cell::new(role.workload_type),
                Cell::new(role.server_count).set_alignment(CellAlignment::Right),
                Cell::new(tolerance),
                Cell::new(&tier.small_sku),
                Cell::new(&tier.large_sku),
            ]);
        }
    }
    format!("{}\n", table)
}
