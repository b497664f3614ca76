use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{AppContext, SummaryArgs};
use saldo_import::ColumnMapping;

#[derive(Parser)]
#[command(name = "saldo", about = "Categorize bank statement exports and summarize spending by month.")]
struct Cli {
    /// Config file (default: the per-user saldo.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a CSV/XLSX statement and print monthly totals and spending by category.
    Summary {
        /// Statement file
        file: PathBuf,
        /// Column holding the transaction date
        #[arg(long)]
        date: String,
        /// Column holding the description
        #[arg(long)]
        title: String,
        /// Column holding the signed amount
        #[arg(long)]
        amount: String,
        /// Declared income for a month, e.g. 2024-01=4500,00 (repeatable)
        #[arg(long)]
        income: Vec<String>,
        /// Only count category spending for this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Print the category a description falls into.
    Categorize { text: String },
    /// Manage the category keyword rules.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
}

#[derive(Subcommand)]
enum CategoriesCommands {
    /// List categories in match order.
    List,
    /// Add a category, or replace the keywords of an existing one.
    Add {
        name: String,
        /// Comma-separated keywords, e.g. "petshop, ração"
        keywords: String,
    },
    /// Remove a category.
    Remove { name: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("saldo=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = AppContext::load(cli.config.as_deref()).and_then(|ctx| match cli.command {
        Commands::Summary {
            file,
            date,
            title,
            amount,
            income,
            month,
        } => commands::summary(
            &ctx,
            SummaryArgs {
                file,
                mapping: ColumnMapping::new(&date, &title, &amount),
                income,
                month,
            },
        ),
        Commands::Categorize { text } => commands::categorize(&ctx, &text),
        Commands::Categories { command } => match command {
            CategoriesCommands::List => commands::categories_list(&ctx),
            CategoriesCommands::Add { name, keywords } => commands::categories_add(&ctx, &name, &keywords),
            CategoriesCommands::Remove { name } => commands::categories_remove(&ctx, &name),
        },
    });

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
