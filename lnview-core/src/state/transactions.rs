use crate::model::Transaction;
use crate::sort::{self, Comparator, Order};

/// On-chain transactions, replaced wholesale on every refresh
#[derive(Default)]
pub struct Transactions {
    list: Vec<Transaction>,
    current: Option<usize>,
    sort: Option<Comparator<Transaction>>,
}

impl Transactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list.  The current selection is left as is, see
    /// [`Transactions::clamp_current`].
    pub fn refresh(&mut self, list: Vec<Transaction>) {
        self.list = list;
        if let Some(sort) = self.sort.as_ref() {
            self.list.sort_by(sort);
        }
    }

    pub fn set_sort(&mut self, sort: Option<Comparator<Transaction>>) {
        self.sort = sort;
        if let Some(sort) = self.sort.as_ref() {
            self.list.sort_by(sort);
        }
    }

    pub fn set_current(&mut self, pos: Option<usize>) {
        self.current = pos;
    }

    pub fn current(&self) -> Option<&Transaction> {
        self.current.and_then(|pos| self.list.get(pos))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Bring the current selection back inside the list
    pub fn clamp_current(&mut self) {
        self.current = match self.current {
            Some(_) if self.list.is_empty() => None,
            Some(pos) => Some(pos.min(self.list.len() - 1)),
            None => None,
        };
    }

    pub fn get(&self, pos: usize) -> Option<&Transaction> {
        self.list.get(pos)
    }

    pub fn list(&self) -> &[Transaction] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

pub fn by_amount(order: Order) -> Comparator<Transaction> {
    sort::by_key(|t: &Transaction| t.amount, order)
}

pub fn by_time(order: Order) -> Comparator<Transaction> {
    sort::by_key(|t: &Transaction| t.time_stamp, order)
}

pub fn by_fee(order: Order) -> Comparator<Transaction> {
    sort::by_key(|t: &Transaction| t.total_fees, order)
}
