use crate::expense::{Category, Clock};
use crate::storage::KeyValueStorage;
use crate::store::ExpenseStore;

/// Input fields of the add-expense form.
///
/// After a successful submit the title and amount are cleared; the category
/// keeps its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseForm {
    pub title: String,
    pub amount: String,
    pub category: Category,
}

impl ExpenseForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit<S: KeyValueStorage, C: Clock>(
        &mut self,
        store: &mut ExpenseStore<S, C>,
    ) -> Option<i64> {
        let id = store.add(&self.title, &self.amount, self.category)?;
        self.title.clear();
        self.amount.clear();
        Some(id)
    }
}
