use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use expensebook::app;
use expensebook::clock::SystemClock;
use expensebook::config::{default_config_path, ResolvedConfig};
use expensebook::listing::ListFilter;
use expensebook::models::{parse_iso_date, CardNetwork, Currency, TransactionKind};
use expensebook::report::ReportPeriod;
use expensebook::storage::JsonFileStore;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_iso_date(s.trim()).ok_or_else(|| format!("Invalid date {s:?} (expected YYYY-MM-DD)"))
}

#[derive(Parser)]
#[command(name = "expensebook")]
#[command(about = "Personal expense tracker")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,

    /// Record a new expense or income
    Add(AddArgs),

    /// Change fields of an existing transaction
    Edit(EditArgs),

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// List transactions grouped by day
    List(ListArgs),

    /// Totals, category breakdown and trend for a period
    Report {
        /// weekly, monthly or yearly
        #[arg(short, long, default_value = "monthly")]
        period: ReportPeriod,

        /// Any day inside the period (defaults to today)
        #[arg(long, value_parser = parse_date_arg)]
        anchor: Option<NaiveDate>,

        /// Only count transactions in this currency
        #[arg(long)]
        currency: Option<Currency>,
    },

    /// Show the category the add form would preselect
    Recommend,

    /// Summary of the recent-transactions feed
    Dashboard,

    /// Manage categories
    #[command(subcommand)]
    Categories(CategoryCommand),

    /// Manage credit cards
    #[command(subcommand)]
    Cards(CardCommand),
}

#[derive(Args)]
struct PaymentArgs {
    /// Card ID or name the transaction was paid with
    #[arg(long)]
    card: Option<String>,

    /// Amount charged on the card (defaults to the amount)
    #[arg(long, requires = "card")]
    card_amount: Option<String>,

    /// When the card charge is due, YYYY-MM-DD (defaults to the date)
    #[arg(long, requires = "card")]
    payment_date: Option<String>,
}

impl PaymentArgs {
    fn into_input(self) -> Option<app::PaymentInput> {
        self.card.map(|card| app::PaymentInput::Card {
            card,
            card_amount: self.card_amount,
            payment_date: self.payment_date,
        })
    }
}

#[derive(Args)]
struct AddArgs {
    /// Amount, e.g. 1250.50
    amount: String,

    /// Category name
    #[arg(long)]
    category: String,

    #[arg(long)]
    subcategory: Option<String>,

    /// YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    currency: Option<Currency>,

    /// Record income instead of an expense
    #[arg(long)]
    income: bool,

    #[command(flatten)]
    payment: PaymentArgs,
}

#[derive(Args)]
struct EditArgs {
    /// Transaction ID
    id: String,

    #[arg(long)]
    amount: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    subcategory: Option<String>,

    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    currency: Option<Currency>,

    /// Mark as paid in cash, clearing card details
    #[arg(long, conflicts_with = "card")]
    cash: bool,

    #[command(flatten)]
    payment: PaymentArgs,
}

#[derive(Args)]
struct ListArgs {
    /// Show a single page (1-based) of the configured page size
    #[arg(long, conflicts_with_all = ["search", "category", "subcategory", "from", "to"])]
    page: Option<usize>,

    /// Match category or subcategory, ignoring case
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    subcategory: Option<String>,

    #[arg(long, value_parser = parse_date_arg)]
    from: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date_arg)]
    to: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum CategoryCommand {
    /// List categories
    List,
    /// Add a category
    Add {
        name: String,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Subcategory name (repeatable)
        #[arg(long = "sub")]
        subcategories: Vec<String>,
    },
    /// Rename or restyle a category
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category
    Delete { id: String },
    /// Append a subcategory
    AddSub { category_id: String, name: String },
    /// Rename the subcategory at INDEX (0-based, storage order)
    RenameSub {
        category_id: String,
        index: usize,
        name: String,
    },
    /// Remove the subcategory at INDEX (0-based, storage order)
    RemoveSub { category_id: String, index: usize },
}

#[derive(Subcommand)]
enum CardCommand {
    /// List cards
    List,
    /// Add a card
    Add {
        name: String,
        /// Last four digits
        #[arg(long)]
        last4: String,
        /// Visa, Visa Débito, Mastercard, Mastercard Débito, American Express or Mercadolibre
        #[arg(long, default_value = "Visa")]
        network: CardNetwork,
        #[arg(long)]
        bg_image: Option<String>,
    },
    /// Change a card
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        last4: Option<String>,
        #[arg(long)]
        network: Option<CardNetwork>,
        #[arg(long)]
        bg_image: Option<String>,
    },
    /// Delete a card
    Delete { id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_categories(
    store: &JsonFileStore,
    config: &ResolvedConfig,
    command: CategoryCommand,
) -> Result<()> {
    match command {
        CategoryCommand::List => print_json(&app::list_categories(store, config).await?),
        CategoryCommand::Add {
            name,
            icon,
            color,
            subcategories,
        } => {
            let input = app::CategoryInput {
                name,
                icon,
                color,
                subcategories,
            };
            print_json(&app::add_category(store, config, &input).await?)
        }
        CategoryCommand::Edit {
            id,
            name,
            icon,
            color,
        } => {
            let edit = app::CategoryEdit { name, icon, color };
            print_json(&app::update_category(store, config, &id, &edit).await?)
        }
        CategoryCommand::Delete { id } => {
            print_json(&app::delete_category(store, config, &id).await?)
        }
        CategoryCommand::AddSub { category_id, name } => {
            print_json(&app::add_subcategory(store, config, &category_id, &name).await?)
        }
        CategoryCommand::RenameSub {
            category_id,
            index,
            name,
        } => print_json(
            &app::rename_subcategory(store, config, &category_id, index, &name).await?,
        ),
        CategoryCommand::RemoveSub { category_id, index } => {
            print_json(&app::remove_subcategory(store, config, &category_id, index).await?)
        }
    }
}

async fn run_cards(store: &JsonFileStore, config: &ResolvedConfig, command: CardCommand) -> Result<()> {
    match command {
        CardCommand::List => print_json(&app::list_cards(store, config).await?),
        CardCommand::Add {
            name,
            last4,
            network,
            bg_image,
        } => {
            let input = app::CardInput {
                name,
                last4,
                network,
                bg_image,
            };
            print_json(&app::add_card(store, config, &input).await?)
        }
        CardCommand::Edit {
            id,
            name,
            last4,
            network,
            bg_image,
        } => {
            let edit = app::CardEdit {
                name,
                last4,
                network,
                bg_image,
            };
            print_json(&app::update_card(store, config, &id, &edit).await?)
        }
        CardCommand::Delete { id } => print_json(&app::delete_card(store, config, &id).await?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let cli = Cli::parse();

    let config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    let clock = SystemClock::in_zone(config.timezone.clone());
    let store = JsonFileStore::new(&config.data_dir);

    let Some(command) = cli.command else {
        println!("Expensebook - Personal Expense Tracker");
        println!("======================================\n");
        println!("Config: {}", cli.config.display());
        println!("Data directory: {}\n", config.data_dir.display());
        println!("Run 'expensebook --help' for commands.");
        return Ok(());
    };

    match command {
        Command::Config => print_json(&app::config_output(&cli.config, &config)),
        Command::Add(args) => {
            let input = app::TransactionInput {
                amount: args.amount,
                currency: args.currency,
                category: args.category,
                subcategory: args.subcategory,
                date: args.date,
                kind: if args.income {
                    TransactionKind::Income
                } else {
                    TransactionKind::Expense
                },
                payment: args.payment.into_input().unwrap_or_default(),
            };
            print_json(&app::add_transaction(&store, &config, &clock, &input).await?)
        }
        Command::Edit(args) => {
            let payment = if args.cash {
                Some(app::PaymentInput::Cash)
            } else {
                args.payment.into_input()
            };
            let edit = app::TransactionEdit {
                amount: args.amount,
                currency: args.currency,
                category: args.category,
                subcategory: args.subcategory,
                date: args.date,
                payment,
            };
            print_json(&app::update_transaction(&store, &config, &args.id, &edit).await?)
        }
        Command::Delete { id } => {
            print_json(&app::delete_transaction(&store, &config, &id).await?)
        }
        Command::List(args) => match args.page {
            Some(page) => print_json(&app::list_page(&store, &config, &clock, page).await?),
            None => {
                let filter = ListFilter {
                    search: args.search,
                    category: args.category,
                    subcategory: args.subcategory,
                    from: args.from,
                    to: args.to,
                };
                print_json(&app::list_transactions(&store, &config, &clock, &filter).await?)
            }
        },
        Command::Report {
            period,
            anchor,
            currency,
        } => {
            let request = app::ReportRequest {
                period,
                anchor,
                currency,
            };
            print_json(&app::report(&store, &config, &clock, &request).await?)
        }
        Command::Recommend => print_json(&app::recommend_defaults(&store, &config).await?),
        Command::Dashboard => print_json(&app::dashboard(&store, &config).await?),
        Command::Categories(command) => run_categories(&store, &config, command).await,
        Command::Cards(command) => run_cards(&store, &config, command).await,
    }
}
