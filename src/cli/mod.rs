use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::application::LedgerService;
use crate::domain::{
    Cents, Transaction, TransactionDraft, TransactionFilter, TransactionId, TransactionType,
    format_cents, format_currency, parse_cents,
};

/// Pocketbook - Income & Expense Ledger
#[derive(Parser)]
#[command(name = "pocketbook")]
#[command(about = "A local-first ledger for recording income and expenses")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "pocketbook.db", global = true)]
    pub database: String,

    /// Currency symbol used when displaying amounts
    #[arg(short, long, default_value = "₹", global = true)]
    pub currency: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a new income or expense entry
    Add {
        /// What the entry is for
        description: String,

        /// Amount (e.g., "50.00" or "50")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Entry type: income, expense
        #[arg(short = 't', long = "type", default_value = "income")]
        transaction_type: String,
    },

    /// Edit an existing entry (omitted fields keep their value)
    Edit {
        /// Entry ID
        id: TransactionId,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New amount
        #[arg(short, long, allow_hyphen_values = true)]
        amount: Option<String>,

        /// New type: income, expense
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Entry ID
        id: TransactionId,
    },

    /// List entries
    List {
        /// Filter: all, income, expense
        #[arg(short, long, default_value = "all")]
        filter: String,
    },

    /// Show detailed entry information
    Show {
        /// Entry ID
        id: TransactionId,
    },

    /// Show total income, total expenses and net balance
    Summary {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export entries to JSON or CSV
    Export {
        /// Format: json, csv
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import entries from JSON or CSV
    Import {
        /// Format: json, csv
        format: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Skip entries identical to existing ones
        #[arg(long)]
        skip_duplicates: bool,

        /// Replace the whole ledger with the imported entries (JSON only)
        #[arg(long)]
        replace: bool,
    },

    /// Remove every entry
    Reset {
        /// Confirm removal of all entries
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let database = self.database;
        let symbol = self.currency.as_str();

        match self.command {
            Commands::Init => {
                LedgerService::init(&database).await?;
                println!("Database initialized: {}", database);
            }

            Commands::Add {
                description,
                amount,
                transaction_type,
            } => {
                let draft = TransactionDraft::new(
                    description,
                    parse_amount(&amount)?,
                    parse_type(&transaction_type)?,
                );
                let mut service = open_service(&database).await?;
                let transaction = service.submit(None, draft).await?;
                println!(
                    "Recorded {}: {} {} ({})",
                    transaction.transaction_type,
                    transaction.description,
                    format_currency(transaction.amount_cents, symbol),
                    transaction.id
                );
                print_totals(&service, symbol);
            }

            Commands::Edit {
                id,
                description,
                amount,
                transaction_type,
            } => {
                let mut service = open_service(&database).await?;
                let draft = apply_edit(
                    service.get_transaction(id)?.to_draft(),
                    description,
                    amount.as_deref(),
                    transaction_type.as_deref(),
                )?;

                let transaction = service.submit(Some(id), draft).await?;
                println!(
                    "Updated {}: {} {}",
                    transaction.id,
                    transaction.description,
                    format_currency(transaction.amount_cents, symbol)
                );
                print_totals(&service, symbol);
            }

            Commands::Delete { id } => {
                let mut service = open_service(&database).await?;
                match service.delete_transaction(id).await? {
                    Some(removed) => {
                        println!("Deleted {}: {}", removed.id, removed.description);
                        print_totals(&service, symbol);
                    }
                    None => println!("No entry with ID {}, nothing deleted.", id),
                }
            }

            Commands::List { filter } => {
                let filter = TransactionFilter::from_str(&filter).with_context(|| {
                    format!("Invalid filter '{}'. Use all, income or expense", filter)
                })?;
                let service = open_service(&database).await?;
                run_list_command(&service, filter, symbol);
            }

            Commands::Show { id } => {
                let service = open_service(&database).await?;
                let transaction = service.get_transaction(id)?;
                print_transaction_details(&transaction, symbol);
            }

            Commands::Summary { format } => {
                let service = open_service(&database).await?;
                run_summary_command(&service, &format, symbol)?;
            }

            Commands::Export { format, output } => {
                let service = open_service(&database).await?;
                run_export_command(&service, &format, output.as_deref())?;
            }

            Commands::Import {
                format,
                input,
                dry_run,
                skip_duplicates,
                replace,
            } => {
                use crate::io::ImportOptions;

                let options = ImportOptions {
                    dry_run,
                    skip_duplicates,
                    replace,
                };
                let mut service = open_service(&database).await?;
                run_import_command(&mut service, &format, input.as_deref(), options).await?;
            }

            Commands::Reset { yes } => {
                if !yes {
                    bail!("Refusing to remove every entry without --yes");
                }
                let mut service = open_service(&database).await?;
                let removed = service.clear().await?;
                println!("Removed {} entries.", removed);
            }
        }

        Ok(())
    }
}

/// Open the ledger, creating the database on first use. A missing database
/// is an empty ledger.
async fn open_service(database: &str) -> Result<LedgerService> {
    LedgerService::init(database)
        .await
        .with_context(|| format!("Cannot open '{}'", database))
}

/// Overlay the fields given to `edit` on the stored entry's draft.
/// Omitted fields keep their current value.
fn apply_edit(
    mut draft: TransactionDraft,
    description: Option<String>,
    amount: Option<&str>,
    transaction_type: Option<&str>,
) -> Result<TransactionDraft> {
    if let Some(description) = description {
        draft.description = description;
    }
    if let Some(amount) = amount {
        draft.amount_cents = parse_amount(amount)?;
    }
    if let Some(transaction_type) = transaction_type {
        draft.transaction_type = parse_type(transaction_type)?;
    }
    Ok(draft)
}

fn parse_amount(amount: &str) -> Result<Cents> {
    parse_cents(amount).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", amount))
}

fn parse_type(transaction_type: &str) -> Result<TransactionType> {
    TransactionType::from_str(transaction_type).with_context(|| {
        format!(
            "Invalid type '{}'. Use income or expense",
            transaction_type
        )
    })
}

fn print_totals(service: &LedgerService, symbol: &str) {
    let totals = service.totals();
    println!(
        "Income: {}  Expenses: {}  Net: {}",
        format_currency(totals.income, symbol),
        format_currency(totals.expense, symbol),
        format_currency(totals.net, symbol)
    );
}

fn run_list_command(service: &LedgerService, filter: TransactionFilter, symbol: &str) {
    let transactions = service.list_transactions(filter);

    if transactions.is_empty() {
        println!("No entries found for this filter.");
        return;
    }

    println!(
        "{:<6} {:<10} {:<8} {:<30} {:>15}",
        "ID", "DATE", "TYPE", "DESCRIPTION", "AMOUNT"
    );
    println!("{}", "-".repeat(73));
    for t in &transactions {
        println!(
            "{:<6} {:<10} {:<8} {:<30} {:>15}",
            t.id,
            t.date.format("%Y-%m-%d"),
            t.transaction_type,
            truncate(&t.description, 30),
            format!(
                "{}{}",
                t.transaction_type.sign(),
                format_currency(t.amount_cents, symbol)
            )
        );
    }
}

fn print_transaction_details(transaction: &Transaction, symbol: &str) {
    println!("Entry: {}", transaction.id);
    println!("  Description:  {}", transaction.description);
    println!("  Type:         {}", transaction.transaction_type);
    println!(
        "  Amount:       {}{}",
        transaction.transaction_type.sign(),
        format_currency(transaction.amount_cents, symbol)
    );
    println!(
        "  Date:         {}",
        transaction.date.format("%Y-%m-%d %H:%M:%S")
    );
}

fn run_summary_command(service: &LedgerService, format: &str, symbol: &str) -> Result<()> {
    let report = service.summary();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "csv" => {
            println!("type,amount,count");
            println!(
                "income,{},{}",
                format_cents(report.total_income),
                report.income_count
            );
            println!(
                "expense,{},{}",
                format_cents(report.total_expense),
                report.expense_count
            );
            println!(
                "net,{},{}",
                format_cents(report.net),
                report.transaction_count()
            );
        }
        "table" => {
            println!(
                "Total Income:   {:>15}  ({} entries)",
                format_currency(report.total_income, symbol),
                report.income_count
            );
            println!(
                "Total Expenses: {:>15}  ({} entries)",
                format_currency(report.total_expense, symbol),
                report.expense_count
            );
            println!("{}", "-".repeat(32));
            println!(
                "Net Balance:    {:>15}",
                format_currency(report.net, symbol)
            );
        }
        other => bail!("Unknown format '{}'. Use table, json or csv", other),
    }

    Ok(())
}

fn run_export_command(service: &LedgerService, format: &str, output: Option<&str>) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create '{}'", path))?,
        ),
        None => Box::new(stdout()),
    };

    let exporter = Exporter::new(service);
    let count = match format {
        "json" => exporter.export_json(writer)?,
        "csv" => exporter.export_csv(writer)?,
        other => bail!("Unknown export format '{}'. Use json or csv", other),
    };
    eprintln!("Exported {} entries", count);

    Ok(())
}

async fn run_import_command(
    service: &mut LedgerService,
    format: &str,
    input: Option<&str>,
    options: crate::io::ImportOptions,
) -> Result<()> {
    use crate::io::Importer;
    use std::fs::File;
    use std::io::{Read, stdin};

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            Box::new(File::open(path).with_context(|| format!("Failed to open '{}'", path))?)
        }
        None => Box::new(stdin()),
    };

    let dry_run = options.dry_run;
    let mut importer = Importer::new(service);
    let result = match format {
        "json" => importer.import_json(reader, options).await?,
        "csv" if options.replace => bail!("--replace is only supported for JSON imports"),
        "csv" => importer.import_csv(reader, options).await?,
        other => bail!("Unknown import format '{}'. Use json or csv", other),
    };

    if dry_run {
        println!("Dry run, nothing written");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}{}: {}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!(" ({})", f))
                    .unwrap_or_default(),
                error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{}...", kept)
    }
}
