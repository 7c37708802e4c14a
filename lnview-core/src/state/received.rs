use std::collections::HashSet;

use log::*;

use crate::model::Invoice;
use crate::sort::{self, Comparator, Order};

/// Settled invoices, optionally restricted to those settled since a cutoff
#[derive(Default)]
pub struct Received {
    list: Vec<Invoice>,
    // hex payment hashes
    index: HashSet<String>,
    // seconds since the epoch
    since: Option<i64>,
    sort: Option<Comparator<Invoice>>,
}

impl Received {
    pub fn new(since: Option<i64>) -> Self {
        Received { since, ..Default::default() }
    }

    /// Insert a settled invoice.  Returns whether the invoice was retained.
    pub fn add(&mut self, invoice: Invoice) -> bool {
        if !invoice.is_settled() {
            return false;
        }
        if let Some(since) = self.since {
            if invoice.timestamp() < since {
                trace!("received: {} older than {}", invoice.payment_hash(), since);
                return false;
            }
        }
        let hash = invoice.payment_hash();
        if !self.index.insert(hash) {
            return false;
        }
        self.list.push(invoice);
        if let Some(sort) = self.sort.as_ref() {
            self.list.sort_by(sort);
        }
        true
    }

    /// Set the active order and re-sort.  `None` keeps the current order for
    /// later insertions.
    pub fn set_sort(&mut self, sort: Option<Comparator<Invoice>>) {
        self.sort = sort;
        if let Some(sort) = self.sort.as_ref() {
            self.list.sort_by(sort);
        }
    }

    pub fn contains(&self, payment_hash: &str) -> bool {
        self.index.contains(payment_hash)
    }

    pub fn get(&self, pos: usize) -> Option<&Invoice> {
        self.list.get(pos)
    }

    pub fn list(&self) -> &[Invoice] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

pub fn by_amount(order: Order) -> Comparator<Invoice> {
    sort::by_key(|i: &Invoice| i.amount(), order)
}

pub fn by_date(order: Order) -> Comparator<Invoice> {
    sort::by_key(|i: &Invoice| i.timestamp(), order)
}

pub fn by_memo(order: Order) -> Comparator<Invoice> {
    Box::new(move |a: &Invoice, b: &Invoice| sort::cmp(a.memo.as_str(), b.memo.as_str(), order))
}
