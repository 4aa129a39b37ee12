// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use expense_tracker::config::{default_config_path, init_config, Config};
use expense_tracker::logging::{init_logging, LogTarget};
use expense_tracker::{
    export_csv, load_config, open_storage, write_csv, Category, DerivedView, ExpenseStore,
    KeyValueStorage, StorageBackend,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", version, about = "Track everyday expenses from the terminal")]
struct Cli {
    /// Config file (default: ~/.expense-tracker/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory from the config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the storage backend: sqlite, json or memory
    #[arg(long, global = true)]
    storage: Option<StorageBackend>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,

    /// Add one expense
    Add {
        title: String,
        amount: String,
        /// Food, Travel, Shopping, Rent or Other
        #[arg(long, short, default_value = "Food")]
        category: Category,
    },

    /// Print the history in insertion order
    List,

    /// Delete the expense with this id
    Remove { id: i64 },

    /// Delete every expense (asks first)
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Total, per-category breakdown and trend
    Summary,

    /// Write the history as CSV
    Export {
        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut cfg = load_config(&config_path)?;
    if let Some(dir) = cli.data_dir {
        cfg.storage.data_dir = Some(dir);
    }
    if let Some(backend) = cli.storage {
        cfg.storage.backend = backend;
    }

    let command = cli.command.unwrap_or(Command::Tui);

    // the TUI owns the terminal, so its logs go to a file
    let log_target = match command {
        Command::Tui => LogTarget::File(cfg.log_path()?),
        _ => LogTarget::Stderr,
    };
    init_logging(&cfg.logging.level, log_target)?;

    if let Command::Config { command } = command {
        return run_config(command, &cfg, &config_path);
    }

    let data_dir = cfg.data_dir()?;
    let storage = open_storage(cfg.storage.backend, &data_dir)?;
    let mut store = ExpenseStore::new(storage).with_date_format(&cfg.display.date_format);

    match command {
        Command::Tui => run_tui(store, &cfg)?,
        Command::Add {
            title,
            amount,
            category,
        } => match store.add(&title, &amount, category) {
            Some(id) => {
                if let Some(expense) = store.get(id) {
                    println!(
                        "✓ Added #{} {} ({}) {}",
                        expense.id,
                        expense.title,
                        expense.category,
                        cfg.display.format_amount(expense.amount)
                    );
                }
            }
            None => println!("Nothing added: a title and a numeric amount are required"),
        },
        Command::List => print_list(&store, &cfg),
        Command::Remove { id } => {
            if store.remove(id) {
                println!("✓ Removed #{}", id);
            } else {
                println!("No expense with id {}", id);
            }
        }
        Command::Clear { yes } => {
            let cleared = store.clear(|question| yes || prompt_yes_no(question));
            if cleared {
                println!("✓ All expenses cleared");
            } else {
                println!("Nothing cleared");
            }
        }
        Command::Summary => print_summary(&DerivedView::compute(store.expenses()), &cfg),
        Command::Export { output } => match output {
            Some(path) => {
                let rows = export_csv(&path, store.expenses())?;
                println!("✓ Exported {} expenses to {}", rows, path.display());
            }
            None => {
                write_csv(io::stdout().lock(), store.expenses())?;
            }
        },
        Command::Config { .. } => {}
    }

    Ok(())
}

fn run_config(command: ConfigCommand, cfg: &Config, path: &Path) -> Result<()> {
    match command {
        ConfigCommand::Init => {
            if init_config(path)? {
                println!("Wrote {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
        ConfigCommand::Show => {
            println!("# {}", path.display());
            println!("# data dir: {}", cfg.data_dir()?.display());
            print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
        }
    }
    Ok(())
}

fn prompt_yes_no(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_list<S: KeyValueStorage>(store: &ExpenseStore<S>, cfg: &Config) {
    if store.is_empty() {
        println!("No expenses yet");
        return;
    }

    println!("{:<15} {:<12} {:<28} {:<9} {:>12}", "ID", "Date", "Title", "Category", "Amount");
    for e in store.expenses() {
        println!(
            "{:<15} {:<12} {:<28} {:<9} {:>12}",
            e.id,
            e.date,
            e.title,
            e.category.as_str(),
            cfg.display.format_amount(e.amount)
        );
    }
    println!(
        "\n{} expenses, total {}",
        store.len(),
        cfg.display.format_amount(expense_tracker::total(store.expenses()))
    );
}

fn print_summary(view: &DerivedView, cfg: &Config) {
    println!("📊 Total: {}", cfg.display.format_amount(view.total));

    println!("\nBy category:");
    for slice in &view.breakdown {
        let share = if view.total > 0.0 {
            slice.value / view.total * 100.0
        } else {
            0.0
        };
        println!(
            "  {:<9} {:>12}  {:>5.1}%  {}",
            slice.category.as_str(),
            cfg.display.format_amount(slice.value),
            share,
            slice.color.hex()
        );
    }

    if !view.trend.is_empty() {
        println!("\nTrend:");
        for point in &view.trend {
            println!("  {:<12} {:>12}", point.label, cfg.display.format_amount(point.value));
        }
    }
}

#[cfg(feature = "tui")]
fn run_tui<S: KeyValueStorage>(store: ExpenseStore<S>, cfg: &Config) -> Result<()> {
    let mut app = ui::App::new(store, cfg.display.clone());
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_tui<S: KeyValueStorage>(_store: ExpenseStore<S>, _cfg: &Config) -> Result<()> {
    anyhow::bail!("TUI mode not available; rebuild with `--features tui` or use the subcommands")
}
