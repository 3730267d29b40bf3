use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::reports::{self, matches_query};

pub fn summary(file: &str) -> Result<()> {
    let data = super::load_dataset(file)?;
    let stats = reports::compute_stats(&data);

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![
        Cell::new("Total spent".bold()),
        Cell::new(money(stats.total_spent)),
    ]);
    table.add_row(vec![
        Cell::new("Average / month"),
        Cell::new(money(stats.avg_spent)),
    ]);
    if let Some(max) = &stats.max_month {
        table.add_row(vec![
            Cell::new(format!("Biggest month ({})", max.date)),
            Cell::new(money(max.total)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Records"),
        Cell::new(data.len().to_string()),
    ]);

    println!("Spending Summary\n{table}");
    if stats.discrepancies > 0 {
        println!(
            "{} {} record(s) have a stored total that differs from their bank sum",
            "Warning:".yellow().bold(),
            stats.discrepancies
        );
    }
    Ok(())
}

pub fn banks(file: &str) -> Result<()> {
    let data = super::load_dataset(file)?;
    let stats = reports::compute_stats(&data);

    let mut table = Table::new();
    table.set_header(vec!["Bank", "Total", "%"]);
    for (name, total) in &stats.bank_totals {
        let pct = if stats.total_spent > 0.0 {
            total / stats.total_spent * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(money(*total)),
            Cell::new(format!("{pct:.1}%")),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(stats.total_spent)),
        Cell::new(""),
    ]);

    println!("Per-Bank Totals\n{table}");
    Ok(())
}

pub fn register(file: &str, query: Option<String>) -> Result<()> {
    let data = super::load_dataset(file)?;
    let query = query.unwrap_or_default();

    let mut header: Vec<String> = vec!["Date".to_string()];
    header.extend(data.bank_names.iter().cloned());
    header.extend(["Total", "家用", "房租", "定期", "額外", "Note"].map(String::from));

    let mut table = Table::new();
    table.set_header(header);

    let mut shown = 0usize;
    let mut total = 0.0;
    for idx in reports::chronological(&data) {
        let rec = &data.records[idx];
        if !matches_query(rec, &query) {
            continue;
        }
        let mut row: Vec<Cell> = vec![Cell::new(&rec.date)];
        for bank in &data.bank_names {
            row.push(Cell::new(money(rec.bank_amount(bank))));
        }
        row.push(Cell::new(money(rec.total).red().bold()));
        for amount in [rec.family, rec.rent, rec.periodic, rec.extra] {
            row.push(Cell::new(money(amount)));
        }
        row.push(Cell::new(&rec.note));
        table.add_row(row);
        shown += 1;
        total += rec.total;
    }

    println!("Record Register\n{table}");
    if query.is_empty() {
        println!("{} records | {}", shown, money(total));
    } else {
        println!("{} of {} records match '{query}' | {}", shown, data.len(), money(total));
    }
    Ok(())
}
