// Expense Store - the single owner of the expense collection
//
// Every mutation goes through add/remove/clear/load and is followed by a
// full rewrite of the persisted blob. Nothing else writes the collection.

use crate::expense::{parse_amount, Category, Clock, Expense, SystemClock};
use crate::storage::KeyValueStorage;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Key of the one slot holding the serialized collection
pub const STORAGE_KEY: &str = "expenses";

/// Question shown before clear-all
pub const CLEAR_PROMPT: &str = "Are you sure you want to clear all expenses?";

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

pub struct ExpenseStore<S: KeyValueStorage, C: Clock = SystemClock> {
    storage: S,
    clock: C,
    date_format: String,
    expenses: Vec<Expense>,
    last_id: i64,
    revision: u64,
    /// Distinguishes stores within the process
    store_id: u64,
}

impl<S: KeyValueStorage> ExpenseStore<S, SystemClock> {
    /// Open a store over `storage`, restoring whatever it already holds.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: KeyValueStorage, C: Clock> ExpenseStore<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self {
        let mut store = Self {
            storage,
            clock,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            expenses: Vec::new(),
            last_id: 0,
            revision: 0,
            store_id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
        };
        store.load();
        store
    }

    /// chrono format string used for the `date` of new records
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Replace the in-memory collection with the persisted one.
    ///
    /// Absent or unparsable data yields an empty collection.
    pub fn load(&mut self) {
        self.expenses = match self.storage.get(STORAGE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Expense>>(&blob) {
                Ok(expenses) => expenses,
                Err(err) => {
                    warn!(error = %err, "persisted expenses unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("no persisted expenses");
                Vec::new()
            }
            Err(err) => {
                warn!(error = %err, "failed to read persisted expenses, starting empty");
                Vec::new()
            }
        };

        self.last_id = self.expenses.iter().map(|e| e.id).max().unwrap_or(0);
        self.revision += 1;
        info!(count = self.expenses.len(), "expenses loaded");
    }

    /// Append a new record. Returns its id, or `None` when the title is
    /// blank or the amount isn't a usable number.
    pub fn add(&mut self, title: &str, amount: &str, category: Category) -> Option<i64> {
        let title = title.trim();
        if title.is_empty() {
            debug!("add rejected: empty title");
            return None;
        }
        let Some(amount) = parse_amount(amount) else {
            debug!(amount, "add rejected: amount not numeric");
            return None;
        };

        let id = self.next_id();
        self.expenses.push(Expense {
            id,
            title: title.to_string(),
            amount,
            category,
            date: self.clock.today(&self.date_format),
        });
        self.revision += 1;
        debug!(id, %category, amount, "expense added");

        self.persist();
        Some(id)
    }

    /// Drop the record with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        if self.expenses.len() == before {
            return false;
        }

        self.revision += 1;
        debug!(id, "expense removed");
        self.persist();
        true
    }

    /// Empty the collection if `confirm` agrees to [`CLEAR_PROMPT`].
    pub fn clear<F>(&mut self, confirm: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(CLEAR_PROMPT) {
            debug!("clear declined");
            return false;
        }

        let dropped = self.expenses.len();
        self.expenses.clear();
        self.revision += 1;
        info!(dropped, "expenses cleared");
        self.persist();
        true
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    /// Records in insertion order
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn get(&self, id: i64) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Bumped on every effective mutation and on load
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Process-unique id of this store; paired with `revision` it names one
    /// exact state of one collection.
    pub fn store_id(&self) -> u64 {
        self.store_id
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// Millisecond timestamp, nudged forward when the clock hasn't moved
    fn next_id(&mut self) -> i64 {
        let now = self.clock.now_millis();
        let id = if now > self.last_id { now } else { self.last_id + 1 };
        self.last_id = id;
        id
    }

    fn persist(&mut self) {
        let blob = match serde_json::to_string(&self.expenses) {
            Ok(blob) => blob,
            Err(err) => {
                warn!(error = %err, "failed to serialize expenses");
                return;
            }
        };
        if let Err(err) = self.storage.set(STORAGE_KEY, &blob) {
            warn!(error = %err, "failed to persist expenses");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::FixedClock;
    use crate::storage::MemoryStorage;
    use anyhow::{bail, Result};

    fn test_store() -> ExpenseStore<MemoryStorage, FixedClock> {
        ExpenseStore::with_clock(MemoryStorage::new(), FixedClock::new(1_000, "2026-10-14"))
    }

    fn persisted(store: &ExpenseStore<MemoryStorage, FixedClock>) -> Vec<Expense> {
        let blob = store.storage().get(STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&blob).unwrap()
    }

    /// Storage whose writes always fail
    struct ReadOnlyStorage;

    impl KeyValueStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            bail!("read-only")
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            bail!("read-only")
        }
    }

    #[test]
    fn test_add_appends_and_persists() {
        let mut store = test_store();

        let id = store.add("Coffee", "150", Category::Food).unwrap();

        assert_eq!(store.len(), 1);
        let expense = store.get(id).unwrap();
        assert_eq!(expense.title, "Coffee");
        assert_eq!(expense.amount, 150.0);
        assert_eq!(expense.date, "2026-10-14");
        assert_eq!(persisted(&store), store.expenses());
    }

    #[test]
    fn test_add_rejects_blank_title_and_bad_amount() {
        let mut store = test_store();
        let revision = store.revision();

        assert_eq!(store.add("", "10", Category::Food), None);
        assert_eq!(store.add("   ", "10", Category::Food), None);
        assert_eq!(store.add("Lunch", "", Category::Food), None);
        assert_eq!(store.add("Lunch", "ten", Category::Food), None);

        assert!(store.is_empty());
        assert_eq!(store.revision(), revision);
        assert_eq!(store.storage().get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_add_trims_title() {
        let mut store = test_store();
        let id = store.add("  Bus  ", "2", Category::Travel).unwrap();
        assert_eq!(store.get(id).unwrap().title, "Bus");
    }

    #[test]
    fn test_ids_increase_on_frozen_clock() {
        let mut store = test_store();

        let a = store.add("A", "1", Category::Food).unwrap();
        let b = store.add("B", "1", Category::Food).unwrap();
        let c = store.add("C", "1", Category::Food).unwrap();

        assert_eq!(a, 1_000);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_remove_existing_and_missing() {
        let mut store = test_store();
        let keep = store.add("Keep", "5", Category::Rent).unwrap();
        let drop = store.add("Drop", "7", Category::Other).unwrap();

        assert!(store.remove(drop));
        assert_eq!(store.len(), 1);
        assert_eq!(store.expenses()[0].id, keep);

        let revision = store.revision();
        assert!(!store.remove(drop));
        assert!(!store.remove(424242));
        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), revision);
        assert_eq!(persisted(&store).len(), 1);
    }

    #[test]
    fn test_clear_needs_confirmation() {
        let mut store = test_store();
        store.add("A", "1", Category::Food);
        store.add("B", "2", Category::Shopping);

        let mut asked = String::new();
        assert!(!store.clear(|msg| {
            asked = msg.to_string();
            false
        }));
        assert_eq!(asked, CLEAR_PROMPT);
        assert_eq!(store.len(), 2);

        assert!(store.clear(|_| true));
        assert!(store.is_empty());
        assert!(persisted(&store).is_empty());
    }

    #[test]
    fn test_declined_clear_does_not_write() {
        let mut storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "[]").unwrap();
        let mut store = ExpenseStore::with_clock(storage, FixedClock::new(1, "d"));
        store.add("A", "1", Category::Food);
        let before = store.storage().get(STORAGE_KEY).unwrap();

        store.clear(|_| false);

        assert_eq!(store.storage().get(STORAGE_KEY).unwrap(), before);
    }

    #[test]
    fn test_load_restores_and_continues_ids() {
        let mut store = test_store();
        store.add("Coffee", "150", Category::Food);
        store.add("Bus", "50", Category::Travel);
        let saved = store.storage().get(STORAGE_KEY).unwrap().unwrap();

        let mut storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, &saved).unwrap();
        let mut restarted = ExpenseStore::with_clock(storage, FixedClock::new(0, "2026-10-15"));

        assert_eq!(restarted.expenses(), store.expenses());
        let id = restarted.add("Rent", "900", Category::Rent).unwrap();
        assert!(id > store.expenses()[1].id);
    }

    #[test]
    fn test_load_garbage_starts_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "{ definitely not a list").unwrap();

        let store = ExpenseStore::with_clock(storage, FixedClock::new(1, "d"));

        assert!(store.is_empty());
    }

    /// Storage whose reads always fail
    struct UnreadableStorage;

    impl KeyValueStorage for UnreadableStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            bail!("disk on fire")
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_read_starts_empty() {
        let mut store = ExpenseStore::with_clock(UnreadableStorage, FixedClock::new(5, "d"));

        assert!(store.is_empty());
        assert_eq!(store.add("Coffee", "3", Category::Food), Some(5));
    }

    #[test]
    fn test_store_ids_differ() {
        let a = test_store();
        let b = test_store();
        assert_ne!(a.store_id(), b.store_id());
        assert_eq!(a.revision(), b.revision());
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let mut store = ExpenseStore::with_clock(ReadOnlyStorage, FixedClock::new(1, "d"));

        assert!(store.add("Coffee", "3", Category::Food).is_some());
        assert_eq!(store.len(), 1);
    }
}
