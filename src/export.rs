// CSV export of the expense history, insertion order preserved

use crate::expense::Expense;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Category")]
    category: &'static str,
    #[serde(rename = "Amount")]
    amount: f64,
}

impl<'a> From<&'a Expense> for CsvRow<'a> {
    fn from(e: &'a Expense) -> Self {
        Self {
            id: e.id,
            date: &e.date,
            title: &e.title,
            category: e.category.as_str(),
            amount: e.amount,
        }
    }
}

/// Write `expenses` as CSV with a header row. Returns the number of rows.
pub fn write_csv<W: Write>(writer: W, expenses: &[Expense]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    if expenses.is_empty() {
        wtr.write_record(["ID", "Date", "Title", "Category", "Amount"])?;
    }
    for expense in expenses {
        wtr.serialize(CsvRow::from(expense))
            .with_context(|| format!("Failed to serialize expense {}", expense.id))?;
    }
    wtr.flush()?;
    Ok(expenses.len())
}

pub fn export_csv(path: &Path, expenses: &[Expense]) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(file, expenses)
}
