//! Live collections mirroring the remote node, and the routines that refresh them.
//!
//! Every collection sits behind its own lock.  Readers take a read guard and
//! see the live backing list for as long as they hold it.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use log::*;

use crate::model::{ChannelBalance, Info, WalletBalance};
use crate::source::{DataSource, ListChannelsOptions, Result};

mod channels;
pub mod received;
pub mod routing;
pub mod transactions;

pub use channels::Channels;
pub use received::Received;
pub use routing::{RoutingLog, ROUTING_LOG_CAPACITY};
pub use transactions::Transactions;

/// Construction options for [`Models`]
#[derive(Clone, Debug)]
pub struct ModelsConfig {
    /// Only keep invoices settled at or after this time (seconds since the epoch)
    pub received_since: Option<i64>,
    pub routing_capacity: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        ModelsConfig { received_since: None, routing_capacity: ROUTING_LOG_CAPACITY }
    }
}

/// The synchronized view of a node
pub struct Models {
    source: Arc<dyn DataSource>,
    pub info: RwLock<Info>,
    pub channels: RwLock<Channels>,
    pub wallet_balance: RwLock<WalletBalance>,
    pub channels_balance: RwLock<ChannelBalance>,
    pub transactions: RwLock<Transactions>,
    pub routing_log: RwLock<RoutingLog>,
    pub received: RwLock<Received>,
}

impl Models {
    pub fn new(source: Arc<dyn DataSource>, config: ModelsConfig) -> Self {
        Models {
            source,
            info: RwLock::new(Info::default()),
            channels: RwLock::new(Channels::new()),
            wallet_balance: RwLock::new(WalletBalance::default()),
            channels_balance: RwLock::new(ChannelBalance::default()),
            transactions: RwLock::new(Transactions::new()),
            routing_log: RwLock::new(RoutingLog::new(config.routing_capacity)),
            received: RwLock::new(Received::new(config.received_since)),
        }
    }

    pub fn source(&self) -> Arc<dyn DataSource> {
        Arc::clone(&self.source)
    }

    pub async fn refresh_info(&self) -> Result<()> {
        let info = self.source.info().await?;
        *self.info.write().unwrap() = info;
        Ok(())
    }

    pub async fn refresh_wallet_balance(&self) -> Result<()> {
        let balance = self.source.wallet_balance().await?;
        *self.wallet_balance.write().unwrap() = balance;
        Ok(())
    }

    pub async fn refresh_channels_balance(&self) -> Result<()> {
        let balance = self.source.channel_balance().await?;
        *self.channels_balance.write().unwrap() = balance;
        Ok(())
    }

    pub async fn refresh_transactions(&self) -> Result<()> {
        let list = self.source.list_transactions().await?;
        let mut transactions = self.transactions.write().unwrap();
        transactions.refresh(list);
        transactions.clamp_current();
        Ok(())
    }

    /// Load the settled invoices the node already knows about
    pub async fn refresh_received(&self) -> Result<()> {
        let invoices = self.source.list_invoices().await?;
        let mut received = self.received.write().unwrap();
        let added = invoices.into_iter().filter(|i| received.add(i.clone())).count();
        debug!("received: loaded {} invoices", added);
        Ok(())
    }

    /// Merge a full channel snapshot, close the channels it no longer
    /// reports, then re-fetch the detail of channels that need it.
    pub async fn refresh_channels(&self) -> Result<()> {
        let snapshot = self.source.list_channels(ListChannelsOptions::default()).await?;
        let mut seen = HashSet::with_capacity(snapshot.len());
        let mut stale = Vec::new();
        {
            let mut channels = self.channels.write().unwrap();
            for channel in snapshot {
                let chan_point = channel.chan_point.clone();
                let num_updates = channel.num_updates;
                let previous = channels.get_by_chan_point(&chan_point).map(|c| c.num_updates);
                channels.update(channel);
                let merged = match channels.get_by_chan_point(&chan_point) {
                    Some(merged) => merged,
                    None => continue,
                };
                // unconfirmed channels have no policies yet
                let updated = previous.map_or(false, |previous| num_updates > previous);
                if merged.id > 0 && (!merged.has_detail() || updated) {
                    stale.push(merged.clone());
                }
                seen.insert(chan_point);
            }
            channels.reconcile(&seen);
        }

        for channel in stale {
            match self.source.get_channel(&channel).await {
                Ok(detail) => self.channels.write().unwrap().update(detail),
                Err(e) => warn!(
                    "{} channels: detail for {} failed: {}",
                    self.source.log_prefix(),
                    channel.chan_point,
                    e
                ),
            }
        }
        Ok(())
    }

    /// Refresh everything, logging failures
    pub async fn refresh_all(&self) {
        let prefix = self.source.log_prefix();
        if let Err(e) = self.refresh_info().await {
            warn!("{} refresh info failed: {}", prefix, e);
        }
        if let Err(e) = self.refresh_channels().await {
            warn!("{} refresh channels failed: {}", prefix, e);
        }
        if let Err(e) = self.refresh_channels_balance().await {
            warn!("{} refresh channels balance failed: {}", prefix, e);
        }
        if let Err(e) = self.refresh_wallet_balance().await {
            warn!("{} refresh wallet balance failed: {}", prefix, e);
        }
        if let Err(e) = self.refresh_transactions().await {
            warn!("{} refresh transactions failed: {}", prefix, e);
        }
    }
}
