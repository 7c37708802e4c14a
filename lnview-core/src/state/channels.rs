use std::collections::{HashMap, HashSet};

use log::*;

use crate::model::{Channel, ChannelStatus};

/// The payment channel registry.
///
/// Channels are kept in the order they were first seen and are never
/// removed.  A channel that disappears from the node's list is kept as a
/// [`ChannelStatus::Closed`] tombstone.
#[derive(Debug, Default)]
pub struct Channels {
    list: Vec<Channel>,
    // channel point -> position in `list`
    index: HashMap<String, usize>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a channel, unless its channel point is already known
    pub fn add(&mut self, channel: Channel) {
        if self.index.contains_key(&channel.chan_point) {
            return;
        }
        debug!("channels: add {} {}", channel.chan_point, channel.status);
        self.index.insert(channel.chan_point.clone(), self.list.len());
        self.list.push(channel);
    }

    /// Merge a fresh view of a channel into the registry.
    ///
    /// Balances and counters always take the new value.  The last update
    /// timestamp, the policies and the remote node are only replaced when
    /// the new value carries them.
    pub fn update(&mut self, new: Channel) {
        let pos = match self.index.get(&new.chan_point) {
            Some(pos) => *pos,
            None => return self.add(new),
        };
        let old = &mut self.list[pos];
        if new.id > 0 {
            old.id = new.id;
        }
        if old.status != new.status {
            debug!("channels: {} {} -> {}", old.chan_point, old.status, new.status);
            old.status = new.status;
        }
        old.capacity = new.capacity;
        old.local_balance = new.local_balance;
        old.remote_balance = new.remote_balance;
        old.commit_fee = new.commit_fee;
        old.commit_weight = new.commit_weight;
        old.fee_per_kw = new.fee_per_kw;
        old.unsettled_balance = new.unsettled_balance;
        old.total_amount_sent = new.total_amount_sent;
        old.total_amount_received = new.total_amount_received;
        old.num_updates = new.num_updates;
        old.csv_delay = new.csv_delay;
        old.private = new.private;
        old.pending_htlc = new.pending_htlc;
        if !new.remote_pubkey.is_empty() {
            old.remote_pubkey = new.remote_pubkey;
        }
        if new.last_update.is_some() {
            old.last_update = new.last_update;
        }
        if new.node.is_some() {
            old.node = new.node;
        }
        if new.local_policy.is_some() {
            old.local_policy = new.local_policy;
        }
        if new.remote_policy.is_some() {
            old.remote_policy = new.remote_policy;
        }
    }

    /// Mark every channel missing from `seen` as closed.
    /// Returns the number of channels that transitioned.
    pub fn reconcile(&mut self, seen: &HashSet<String>) -> usize {
        let mut closed = 0;
        for channel in self.list.iter_mut() {
            if channel.status != ChannelStatus::Closed && !seen.contains(&channel.chan_point) {
                info!("channels: {} no longer reported, closed", channel.chan_point);
                channel.status = ChannelStatus::Closed;
                closed += 1;
            }
        }
        closed
    }

    pub fn contains(&self, chan_point: &str) -> bool {
        self.index.contains_key(chan_point)
    }

    pub fn get_by_chan_point(&self, chan_point: &str) -> Option<&Channel> {
        self.index.get(chan_point).map(|pos| &self.list[*pos])
    }

    pub fn get(&self, pos: usize) -> Option<&Channel> {
        self.list.get(pos)
    }

    /// The channels in registry order
    pub fn list(&self) -> &[Channel] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}
