// Derived views - read-only data computed from the collection for display
//
// Nothing here knows about a renderer. The UI turns these label/value series
// into charts.

use crate::expense::{Category, Clock, Expense};
use crate::storage::KeyValueStorage;
use crate::store::ExpenseStore;
use serde::Serialize;

/// Breakdown colors, assigned by category index
pub const PALETTE: [Rgb; 5] = [
    Rgb(0xFF, 0x63, 0x84),
    Rgb(0x36, 0xA2, 0xEB),
    Rgb(0xFF, 0xCE, 0x56),
    Rgb(0x4B, 0xC0, 0xC0),
    Rgb(0x99, 0x66, 0xFF),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub category: Category,
    pub value: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct DerivedView {
    pub total: f64,
    pub trend: Vec<SeriesPoint>,
    pub breakdown: Vec<CategorySlice>,
}

impl DerivedView {
    pub fn compute(expenses: &[Expense]) -> Self {
        Self {
            total: total(expenses),
            trend: trend_series(expenses),
            breakdown: category_breakdown(expenses),
        }
    }

    pub fn slice(&self, category: Category) -> Option<&CategorySlice> {
        self.breakdown.iter().find(|s| s.category == category)
    }

    /// Largest single trend value, 0 when empty
    pub fn trend_max(&self) -> f64 {
        self.trend.iter().map(|p| p.value).fold(0.0, f64::max)
    }
}

pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// One point per record, insertion order, no merging of same-day entries
pub fn trend_series(expenses: &[Expense]) -> Vec<SeriesPoint> {
    expenses
        .iter()
        .map(|e| SeriesPoint {
            label: e.date.clone(),
            value: e.amount,
        })
        .collect()
}

/// All five categories in enumeration order, zero when unused
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategorySlice> {
    let mut sums = [0.0_f64; Category::ALL.len()];
    for expense in expenses {
        sums[expense.category.index()] += expense.amount;
    }

    Category::ALL
        .iter()
        .zip(sums)
        .enumerate()
        .map(|(i, (category, value))| CategorySlice {
            category: *category,
            value,
            color: PALETTE[i % PALETTE.len()],
        })
        .collect()
}

/// Memoizes the derived view against the store identity and revision.
///
/// Pointing one builder at several stores is allowed; switching stores
/// always recomputes.
#[derive(Debug, Default)]
pub struct ViewBuilder {
    cached: Option<((u64, u64), DerivedView)>,
    computations: usize,
}

impl ViewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current view; recomputed only when the store changed since last call.
    pub fn refresh<S: KeyValueStorage, C: Clock>(
        &mut self,
        store: &ExpenseStore<S, C>,
    ) -> &DerivedView {
        let revision = store.revision();
        let key = (store.store_id(), revision);
        if !matches!(&self.cached, Some((seen, _)) if *seen == key) {
            self.cached = None;
        }

        let computations = &mut self.computations;
        let (_, view) = self.cached.get_or_insert_with(|| {
            *computations += 1;
            tracing::trace!(revision, "recomputing derived view");
            (key, DerivedView::compute(store.expenses()))
        });
        view
    }

    /// Last computed view without checking the store
    pub fn current(&self) -> Option<&DerivedView> {
        self.cached.as_ref().map(|(_, view)| view)
    }

    /// How many times the view was rebuilt
    pub fn computations(&self) -> usize {
        self.computations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::FixedClock;
    use crate::storage::MemoryStorage;

    fn expense(id: i64, amount: f64, category: Category, date: &str) -> Expense {
        Expense {
            id,
            title: format!("item {id}"),
            amount,
            category,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_empty_collection() {
        let view = DerivedView::compute(&[]);

        assert_eq!(view.total, 0.0);
        assert!(view.trend.is_empty());
        assert_eq!(view.breakdown.len(), 5);
        assert!(view.breakdown.iter().all(|s| s.value == 0.0));
        assert_eq!(view.trend_max(), 0.0);
    }

    #[test]
    fn test_trend_keeps_insertion_order_and_same_day_points() {
        let expenses = vec![
            expense(1, 10.0, Category::Food, "2026-10-14"),
            expense(2, 5.0, Category::Food, "2026-10-12"),
            expense(3, 7.0, Category::Rent, "2026-10-14"),
            expense(4, 1.0, Category::Rent, "2026-10-14"),
        ];

        let trend = trend_series(&expenses);

        let labels: Vec<_> = trend.iter().map(|p| p.label.as_str()).collect();
        let values: Vec<_> = trend.iter().map(|p| p.value).collect();
        assert_eq!(labels, ["2026-10-14", "2026-10-12", "2026-10-14", "2026-10-14"]);
        assert_eq!(values, [10.0, 5.0, 7.0, 1.0]);
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let expenses = vec![
            expense(1, 12.5, Category::Food, "d"),
            expense(2, 80.0, Category::Rent, "d"),
            expense(3, 3.25, Category::Other, "d"),
            expense(4, 0.25, Category::Food, "d"),
        ];

        let view = DerivedView::compute(&expenses);
        let sum: f64 = view.breakdown.iter().map(|s| s.value).sum();

        assert_eq!(view.total, 96.0);
        assert!((sum - view.total).abs() < 1e-9);
        assert_eq!(view.slice(Category::Food).unwrap().value, 12.75);
        assert_eq!(view.slice(Category::Shopping).unwrap().value, 0.0);
    }

    #[test]
    fn test_breakdown_colors_follow_index() {
        let breakdown = category_breakdown(&[]);

        let order: Vec<_> = breakdown.iter().map(|s| s.category).collect();
        assert_eq!(order, Category::ALL);
        for (i, slice) in breakdown.iter().enumerate() {
            assert_eq!(slice.color, PALETTE[i]);
        }
        assert_eq!(PALETTE[0].hex(), "#FF6384");
    }

    #[test]
    fn test_view_builder_memoizes_on_revision() {
        let mut store =
            ExpenseStore::with_clock(MemoryStorage::new(), FixedClock::new(1, "2026-10-14"));
        let mut builder = ViewBuilder::new();

        assert_eq!(builder.refresh(&store).total, 0.0);
        builder.refresh(&store);
        assert_eq!(builder.computations(), 1);

        store.add("Coffee", "4", Category::Food);
        assert_eq!(builder.refresh(&store).total, 4.0);
        assert_eq!(builder.computations(), 2);

        // rejected add doesn't change the revision
        store.add("", "4", Category::Food);
        builder.refresh(&store);
        assert_eq!(builder.computations(), 2);
        assert_eq!(builder.current().unwrap().trend.len(), 1);
    }

    #[test]
    fn test_view_builder_switching_stores_recomputes() {
        let mut food =
            ExpenseStore::with_clock(MemoryStorage::new(), FixedClock::new(1, "2026-10-14"));
        let mut rent =
            ExpenseStore::with_clock(MemoryStorage::new(), FixedClock::new(1, "2026-10-14"));
        food.add("Lunch", "12", Category::Food);
        rent.add("October", "900", Category::Rent);
        assert_eq!(food.revision(), rent.revision());

        let mut builder = ViewBuilder::new();
        assert_eq!(builder.refresh(&food).total, 12.0);
        assert_eq!(builder.refresh(&rent).total, 900.0);
        assert_eq!(builder.computations(), 2);
    }
}
