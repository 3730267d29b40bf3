use colored::Colorize;

use crate::error::Result;
use crate::fmt::money;
use crate::reports;

pub fn run(file: &str) -> Result<()> {
    let data = super::load_dataset(file)?;
    let stats = reports::compute_stats(&data);

    println!(
        "{} {} records from {}",
        "Parsed".green().bold(),
        data.len(),
        file
    );
    println!("Banks: {}", data.bank_names.join(", "));
    println!("Total spent: {}", money(stats.total_spent));
    if stats.discrepancies > 0 {
        println!(
            "{} {} record(s) have a stored total that differs from their bank sum",
            "Warning:".yellow().bold(),
            stats.discrepancies
        );
    }
    Ok(())
}
