use std::collections::VecDeque;

use log::*;

use crate::model::RoutingEvent;
use crate::sort::{self, Comparator, Order};

/// Default number of routing events kept
pub const ROUTING_LOG_CAPACITY: usize = 512;

/// A bounded log of routing events, oldest first.
///
/// An event for an HTLC pair already in the log updates that entry in place.
/// A new HTLC pair is appended, evicting the oldest entry when full.
#[derive(Debug)]
pub struct RoutingLog {
    log: VecDeque<RoutingEvent>,
    capacity: usize,
}

impl Default for RoutingLog {
    fn default() -> Self {
        Self::new(ROUTING_LOG_CAPACITY)
    }
}

impl RoutingLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        RoutingLog { log: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn insert(&mut self, event: RoutingEvent) {
        let key = event.key();
        if let Some(existing) = self.log.iter_mut().find(|e| e.key() == key) {
            existing.status = event.status;
            existing.failure_code = event.failure_code;
            existing.failure_detail = event.failure_detail;
            existing.last_update = event.last_update;
            return;
        }
        if self.log.len() >= self.capacity {
            let evicted = self.log.pop_front();
            trace!("routing: evict {:?}", evicted.map(|e| e.key()));
        }
        self.log.push_back(event);
    }

    /// Events in insertion order
    pub fn list(&self) -> &VecDeque<RoutingEvent> {
        &self.log
    }

    pub fn get(&self, pos: usize) -> Option<&RoutingEvent> {
        self.log.get(pos)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

pub fn by_time(order: Order) -> Comparator<RoutingEvent> {
    sort::by_key(|e: &RoutingEvent| e.last_update, order)
}

pub fn by_amount(order: Order) -> Comparator<RoutingEvent> {
    sort::by_key(|e: &RoutingEvent| e.amount_msat, order)
}

pub fn by_fee(order: Order) -> Comparator<RoutingEvent> {
    sort::by_key(|e: &RoutingEvent| e.fee_msat, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoutingStatus;

    fn event(htlc: u64, status: RoutingStatus) -> RoutingEvent {
        RoutingEvent {
            incoming_channel_id: 1,
            incoming_htlc_id: htlc,
            outgoing_channel_id: 2,
            outgoing_htlc_id: htlc,
            status,
            amount_msat: 1000 * htlc,
            last_update: htlc,
            ..Default::default()
        }
    }

    #[test]
    fn repeated_key_updates_in_place_test() {
        let mut log = RoutingLog::new(4);
        log.insert(event(1, RoutingStatus::Active));
        log.insert(event(2, RoutingStatus::Active));
        log.insert(RoutingEvent {
            failure_code: 15,
            failure_detail: "no route".to_string(),
            last_update: 99,
            amount_msat: 5,
            ..event(1, RoutingStatus::Failed)
        });
        assert_eq!(log.len(), 2);
        let updated = log.get(0).unwrap();
        assert_eq!(updated.status, RoutingStatus::Failed);
        assert_eq!(updated.failure_code, 15);
        assert_eq!(updated.failure_detail, "no route");
        assert_eq!(updated.last_update, 99);
        // only the status fields are updated
        assert_eq!(updated.amount_msat, 1000);
    }

    #[test]
    fn evicts_oldest_at_capacity_test() {
        let mut log = RoutingLog::new(3);
        for htlc in 1..=3 {
            log.insert(event(htlc, RoutingStatus::Active));
        }
        log.insert(event(2, RoutingStatus::Settled));
        assert_eq!(log.len(), 3);
        assert_eq!(log.get(0).unwrap().incoming_htlc_id, 1);

        log.insert(event(4, RoutingStatus::Active));
        assert_eq!(log.len(), 3);
        let ids: Vec<u64> = log.list().iter().map(|e| e.incoming_htlc_id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(log.get(0).unwrap().status, RoutingStatus::Settled);
    }

    #[test]
    fn never_exceeds_default_capacity_test() {
        let mut log = RoutingLog::default();
        for htlc in 0..(ROUTING_LOG_CAPACITY as u64 + 10) {
            log.insert(event(htlc, RoutingStatus::Settled));
            assert!(log.len() <= log.capacity());
        }
        assert_eq!(log.len(), ROUTING_LOG_CAPACITY);
        assert_eq!(log.get(0).unwrap().incoming_htlc_id, 10);
    }

    #[test]
    fn comparators_test() {
        let mut events = vec![event(2, RoutingStatus::Settled), event(1, RoutingStatus::Settled)];
        events.sort_by(by_time(Order::Asc));
        assert_eq!(events[0].last_update, 1);
        events.sort_by(by_amount(Order::Desc));
        assert_eq!(events[0].amount_msat, 2000);
        events.sort_by(by_fee(Order::Asc));
        assert_eq!(events[0].amount_msat, 2000);
    }
}
