//! Snapshot comparators run on every tick.
//!
//! Each probe keeps the snapshot it saw last.  The first snapshot only sets
//! the baseline.  A failed fetch leaves the baseline untouched.

use async_trait::async_trait;

use crate::events::Event;
use crate::model::{ChannelBalance, Info, WalletBalance};
use crate::source::{DataSource, Result};

#[async_trait]
pub trait Probe: Send {
    fn name(&self) -> &'static str;

    /// Fetch a fresh snapshot and return the events it implies
    async fn probe(&mut self, source: &dyn DataSource) -> Result<Vec<Event>>;
}

/// Watches node info.  Channel counts only report growth.
#[derive(Default)]
pub struct InfoProbe {
    previous: Option<Info>,
}

impl InfoProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn diff(&mut self, info: Info) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(old) = self.previous.as_ref() {
            if info.block_height > old.block_height {
                events.push(Event::BlockReceived);
            }
            if info.num_peers != old.num_peers {
                events.push(Event::PeerUpdated);
            }
            if info.num_pending_channels > old.num_pending_channels {
                events.push(Event::ChannelPending);
            }
            if info.num_active_channels > old.num_active_channels {
                events.push(Event::ChannelActive);
            }
            if info.num_inactive_channels > old.num_inactive_channels {
                events.push(Event::ChannelInactive);
            }
        }
        self.previous = Some(info);
        events
    }
}

#[async_trait]
impl Probe for InfoProbe {
    fn name(&self) -> &'static str {
        "info"
    }

    async fn probe(&mut self, source: &dyn DataSource) -> Result<Vec<Event>> {
        let info = source.info().await?;
        Ok(self.diff(info))
    }
}

#[derive(Default)]
pub struct ChannelBalanceProbe {
    previous: Option<ChannelBalance>,
}

impl ChannelBalanceProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn diff(&mut self, balance: ChannelBalance) -> Vec<Event> {
        let changed = self.previous.as_ref().map_or(false, |old| {
            old.balance != balance.balance
                || old.pending_open_balance != balance.pending_open_balance
        });
        self.previous = Some(balance);
        if changed {
            vec![Event::ChannelBalanceUpdated]
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
impl Probe for ChannelBalanceProbe {
    fn name(&self) -> &'static str {
        "channel balance"
    }

    async fn probe(&mut self, source: &dyn DataSource) -> Result<Vec<Event>> {
        let balance = source.channel_balance().await?;
        Ok(self.diff(balance))
    }
}

/// Off by default, the transaction subscription already reports wallet activity
#[derive(Default)]
pub struct WalletBalanceProbe {
    previous: Option<WalletBalance>,
}

impl WalletBalanceProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn diff(&mut self, balance: WalletBalance) -> Vec<Event> {
        let changed = self.previous.as_ref().map_or(false, |old| *old != balance);
        self.previous = Some(balance);
        if changed {
            vec![Event::WalletBalanceUpdated]
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
impl Probe for WalletBalanceProbe {
    fn name(&self) -> &'static str {
        "wallet balance"
    }

    async fn probe(&mut self, source: &dyn DataSource) -> Result<Vec<Event>> {
        let balance = source.wallet_balance().await?;
        Ok(self.diff(balance))
    }
}
