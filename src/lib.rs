// Expense Tracker - Core Library
// Store, derived views and storage backends; used by the CLI, the TUI and tests

pub mod config;
pub mod expense;
pub mod export;
pub mod form;
pub mod logging;
pub mod storage;
pub mod store;
pub mod views;

// Re-export commonly used types
pub use config::{load_config, Config};
pub use expense::{
    parse_amount, Category, Clock, Expense, FixedClock, ParseCategoryError, SystemClock,
};
pub use export::{export_csv, write_csv};
pub use form::ExpenseForm;
pub use storage::{
    open_storage, JsonFileStorage, KeyValueStorage, MemoryStorage, SqliteStorage,
    StorageBackend,
};
pub use store::{ExpenseStore, CLEAR_PROMPT, STORAGE_KEY};
pub use views::{
    category_breakdown, total, trend_series, CategorySlice, DerivedView, Rgb, SeriesPoint,
    ViewBuilder, PALETTE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
