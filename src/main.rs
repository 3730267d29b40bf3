mod browser;
mod cli;
mod error;
mod fmt;
mod form;
mod importer;
mod models;
mod reports;
mod store;
mod tui;

use clap::Parser;

use cli::{Cli, Commands, ReportCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dashboard { file } => cli::dashboard::run(&file),
        Commands::Browse { file } => cli::browse::run(&file),
        Commands::Import { file } => cli::import::run(&file),
        Commands::Report { command } => match command {
            ReportCommands::Summary { file } => cli::report::summary(&file),
            ReportCommands::Banks { file } => cli::report::banks(&file),
            ReportCommands::Register { file, query } => cli::report::register(&file, query),
        },
        Commands::Export {
            file,
            format,
            output,
        } => cli::export::run(&file, format, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
