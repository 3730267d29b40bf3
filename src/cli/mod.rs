pub mod browse;
pub mod dashboard;
pub mod export;
pub mod import;
pub mod report;

use clap::{Parser, Subcommand, ValueEnum};

use crate::error::Result;
use crate::store::Dataset;

/// Read and parse the CSV export every command starts from. Nothing is
/// cached between invocations; the file is the single source of truth.
pub(crate) fn load_dataset(file: &str) -> Result<Dataset> {
    let text = std::fs::read_to_string(file)?;
    Dataset::from_csv(&text)
}

#[derive(Parser)]
#[command(name = "cardbook", about = "Personal credit-card spending dashboard for the terminal.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive dashboard: totals, per-bank chart, record browser.
    Dashboard {
        /// Path to the 總表 CSV export
        file: String,
    },
    /// Browse, search and edit records in a full-screen table.
    Browse {
        /// Path to the 總表 CSV export
        file: String,
    },
    /// Parse a CSV export and show what was recognized.
    Import {
        /// Path to the 總表 CSV export
        file: String,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export the parsed dataset to CSV or JSON.
    Export {
        /// Path to the 總表 CSV export
        file: String,
        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Output file path (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Headline totals: total spent, monthly average, biggest month.
    Summary {
        /// Path to the 總表 CSV export
        file: String,
    },
    /// Per-bank totals across the whole dataset.
    Banks {
        /// Path to the 總表 CSV export
        file: String,
    },
    /// Full record register in chronological order.
    Register {
        /// Path to the 總表 CSV export
        file: String,
        /// Filter records by date or note substring
        #[arg(long)]
        query: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}
