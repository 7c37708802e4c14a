//! The remote node, as seen by the synchronization core.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use triggered::Listener;

use crate::model::{
    Channel, ChannelBalance, ChannelEdgeUpdate, Info, Invoice, PayReq, Payment, RoutingEvent,
    Transaction, WalletBalance,
};

#[cfg(any(test, feature = "test_utils"))]
pub mod mock;

/// A data source error
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The node could not be reached
    #[error("connection failed: {0}")]
    Connection(String),
    /// The node did not answer in time
    #[error("timed out")]
    Timeout,
    /// The credentials were rejected
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The call or subscription was cancelled by the shutdown signal
    #[error("cancelled")]
    Cancelled,
    /// The node sent something we could not interpret
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// The node reported a failure
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl Error {
    /// Whether this is a clean shutdown rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// Filters for [`DataSource::list_channels`].  The default lists every channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListChannelsOptions {
    pub active_only: bool,
    pub inactive_only: bool,
    pub public_only: bool,
    pub private_only: bool,
    pub pending_only: bool,
}

impl ListChannelsOptions {
    /// Whether a channel passes these filters
    pub fn accepts(&self, channel: &Channel) -> bool {
        use crate::model::ChannelStatus;

        if self.active_only && channel.status != ChannelStatus::Active {
            return false;
        }
        if self.inactive_only && channel.status != ChannelStatus::Inactive {
            return false;
        }
        if self.public_only && channel.private {
            return false;
        }
        if self.private_only && !channel.private {
            return false;
        }
        if self.pending_only && channel.status != ChannelStatus::Opening {
            return false;
        }
        true
    }
}

/// An item pushed by a subscription
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    Invoice(Invoice),
    Transaction(Transaction),
    ChannelEdge(ChannelEdgeUpdate),
    Routing(RoutingEvent),
}

impl Update {
    pub fn kind(&self) -> &'static str {
        match self {
            Update::Invoice(_) => "invoice",
            Update::Transaction(_) => "transaction",
            Update::ChannelEdge(_) => "channel edge",
            Update::Routing(_) => "routing",
        }
    }
}

/// Snapshot calls and push subscriptions against a remote node.
///
/// Snapshot futures are cancelled by dropping them.  Subscriptions push items
/// into `sender` until `shutdown` fires, the receiving side is dropped, or the
/// stream fails.  A subscription that ends because of `shutdown` returns
/// `Ok(())` or [`Error::Cancelled`].
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Identity string for the log
    fn log_prefix(&self) -> String;

    async fn info(&self) -> Result<Info>;

    async fn list_channels(&self, options: ListChannelsOptions) -> Result<Vec<Channel>>;

    /// Re-fetch a channel with its policies, last update and remote node filled in
    async fn get_channel(&self, channel: &Channel) -> Result<Channel>;

    async fn wallet_balance(&self) -> Result<WalletBalance>;

    async fn channel_balance(&self) -> Result<ChannelBalance>;

    async fn list_transactions(&self) -> Result<Vec<Transaction>>;

    async fn list_invoices(&self) -> Result<Vec<Invoice>>;

    async fn decode_pay_req(&self, pay_req: &str) -> Result<PayReq>;

    async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice>;

    async fn lookup_invoice(&self, r_hash: &[u8]) -> Result<Invoice>;

    async fn send_payment(&self, pay_req: &PayReq) -> Result<Payment>;

    async fn subscribe_invoices(&self, shutdown: Listener, sender: mpsc::Sender<Update>)
        -> Result<()>;

    async fn subscribe_transactions(
        &self,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()>;

    async fn subscribe_graph(&self, shutdown: Listener, sender: mpsc::Sender<Update>) -> Result<()>;

    async fn subscribe_routing_events(
        &self,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()>;
}
