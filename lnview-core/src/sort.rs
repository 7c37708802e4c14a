//! Ascending/descending orderings shared by the list views

use core::cmp::Ordering;

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn toggle(self) -> Self {
        match self {
            Order::Asc => Order::Desc,
            Order::Desc => Order::Asc,
        }
    }

    /// Apply the direction to an ascending ordering
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        }
    }
}

/// A total order over list items
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Compare two projections of list items.
///
/// Incomparable values (NaN) compare equal, so that a stable sort keeps the
/// source order for them.
pub fn cmp<T: PartialOrd>(a: T, b: T, order: Order) -> Ordering {
    order.apply(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
}

/// Build a comparator from a key projection
pub fn by_key<T, K, F>(key: F, order: Order) -> Comparator<T>
where
    K: PartialOrd,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    Box::new(move |a: &T, b: &T| cmp(key(a), key(b), order))
}
