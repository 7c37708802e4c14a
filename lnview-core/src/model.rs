//! Entities mirrored from the remote node.
//!
//! These are plain data, as reported by a [`DataSource`](crate::source::DataSource).
//! Amounts are in satoshis unless the field name says otherwise.

use core::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Lifecycle of a payment channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelStatus {
    /// Funding transaction not yet confirmed
    #[default]
    Opening,
    /// Usable for payments
    Active,
    /// Confirmed but the peer is offline
    Inactive,
    /// Cooperative close in progress
    Closing,
    /// Unilateral close in progress
    ForceClosing,
    /// Closing transaction broadcast, waiting for confirmation
    WaitingClose,
    /// No longer reported by the node
    Closed,
}

impl Display for ChannelStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let label = match self {
            ChannelStatus::Opening => "opening",
            ChannelStatus::Active => "active",
            ChannelStatus::Inactive => "inactive",
            ChannelStatus::Closing => "closing",
            ChannelStatus::ForceClosing => "force closing",
            ChannelStatus::WaitingClose => "waiting close",
            ChannelStatus::Closed => "closed",
        };
        write!(f, "{}", label)
    }
}

/// An in-flight HTLC in a channel
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Htlc {
    pub incoming: bool,
    pub amount: i64,
    #[serde(with = "hex::serde")]
    pub hashlock: Vec<u8>,
    pub expiration_height: u32,
}

/// Forwarding policy advertised for one side of a channel
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingPolicy {
    pub time_lock_delta: u32,
    pub min_htlc_msat: i64,
    pub max_htlc_msat: u64,
    pub fee_base_msat: i64,
    pub fee_rate_milli_msat: i64,
    pub disabled: bool,
}

/// A node of the network graph
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub pub_key: String,
    pub alias: String,
    pub last_update: u64,
    pub addresses: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    /// Short channel id, 0 until the funding transaction confirms
    pub id: u64,
    /// Funding outpoint as `txid:index`, the stable identity of a channel
    pub chan_point: String,
    pub status: ChannelStatus,
    pub remote_pubkey: String,
    pub capacity: i64,
    pub local_balance: i64,
    pub remote_balance: i64,
    pub commit_fee: i64,
    pub commit_weight: i64,
    pub fee_per_kw: i64,
    pub unsettled_balance: i64,
    pub total_amount_sent: i64,
    pub total_amount_received: i64,
    /// Number of commitment updates, increases monotonically
    pub num_updates: u64,
    pub csv_delay: u32,
    pub private: bool,
    pub pending_htlc: Vec<Htlc>,
    /// Seconds since the epoch of the last policy update
    pub last_update: Option<u64>,
    pub node: Option<Node>,
    pub local_policy: Option<RoutingPolicy>,
    pub remote_policy: Option<RoutingPolicy>,
}

impl Channel {
    /// Height of the funding block, encoded in the upper 24 bits of the short channel id
    pub fn block_height(&self) -> Option<u32> {
        if self.id == 0 {
            None
        } else {
            Some((self.id >> 40) as u32)
        }
    }

    /// Number of blocks since the funding transaction confirmed
    pub fn age(&self, current_height: u32) -> Option<u32> {
        self.block_height().map(|height| current_height.saturating_sub(height))
    }

    /// The `block x tx x output` form of the short channel id
    pub fn short_channel_id(&self) -> Option<String> {
        self.block_height().map(|height| {
            let tx_index = (self.id >> 16) & 0xff_ffff;
            let output = self.id & 0xffff;
            format!("{}x{}x{}", height, tx_index, output)
        })
    }

    /// Whether the policy detail of this channel is known
    pub fn has_detail(&self) -> bool {
        self.last_update.is_some() && self.local_policy.is_some() && self.remote_policy.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingDirection {
    #[default]
    Send,
    Receive,
    Forward,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingStatus {
    #[default]
    Active,
    Settled,
    Failed,
    LinkFailed,
}

/// A payment attempt sent from, received at, or forwarded through the node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingEvent {
    pub incoming_channel_id: u64,
    pub incoming_htlc_id: u64,
    pub outgoing_channel_id: u64,
    pub outgoing_htlc_id: u64,
    pub direction: RoutingDirection,
    pub status: RoutingStatus,
    pub incoming_timelock: u32,
    pub outgoing_timelock: u32,
    pub amount_msat: u64,
    pub fee_msat: u64,
    pub failure_code: i32,
    pub failure_detail: String,
    pub last_update: u64,
}

impl RoutingEvent {
    /// The identity of the HTLC pair this event reports on
    pub fn key(&self) -> (u64, u64, u64, u64) {
        (
            self.incoming_channel_id,
            self.incoming_htlc_id,
            self.outgoing_channel_id,
            self.outgoing_htlc_id,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceState {
    #[default]
    Open,
    Settled,
    Canceled,
    Accepted,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Invoice {
    pub memo: String,
    #[serde(with = "hex::serde")]
    pub r_hash: Vec<u8>,
    pub value: i64,
    pub value_msat: i64,
    pub amt_paid_sat: i64,
    pub amt_paid_msat: i64,
    pub creation_date: i64,
    pub settle_date: i64,
    pub expiry: i64,
    pub state: InvoiceState,
    pub payment_request: String,
}

impl Invoice {
    pub fn is_settled(&self) -> bool {
        self.state == InvoiceState::Settled
    }

    /// The payment hash, hex encoded
    pub fn payment_hash(&self) -> String {
        hex::encode(&self.r_hash)
    }

    /// Settle date, or the creation date if the invoice was not settled
    pub fn timestamp(&self) -> i64 {
        if self.settle_date > 0 {
            self.settle_date
        } else {
            self.creation_date
        }
    }

    /// Amount paid, or the amount requested if nothing was paid yet
    pub fn amount(&self) -> i64 {
        if self.amt_paid_sat > 0 {
            self.amt_paid_sat
        } else {
            self.value
        }
    }
}

/// An on-chain wallet transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    pub tx_hash: String,
    pub amount: i64,
    pub num_confirmations: i32,
    pub block_hash: String,
    pub block_height: u32,
    pub time_stamp: i64,
    pub total_fees: i64,
    pub dest_addresses: Vec<String>,
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub pub_key: String,
    pub alias: String,
    pub version: String,
    pub num_pending_channels: u32,
    pub num_active_channels: u32,
    pub num_inactive_channels: u32,
    pub num_peers: u32,
    pub block_height: u32,
    pub block_hash: String,
    pub synced: bool,
    pub network: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletBalance {
    pub total_balance: i64,
    pub confirmed_balance: i64,
    pub unconfirmed_balance: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelBalance {
    pub balance: i64,
    pub pending_open_balance: i64,
}

/// A decoded payment request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayReq {
    pub destination: String,
    pub payment_hash: String,
    pub amount: i64,
    pub timestamp: i64,
    pub expiry: i64,
    pub description: String,
    pub cltv_expiry: i64,
    /// The encoded form
    pub string: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub pay_req: PayReq,
    pub amount: i64,
    pub fee: i64,
    pub status: PaymentStatus,
    #[serde(with = "hex::serde")]
    pub preimage: Vec<u8>,
    pub failure: String,
}

/// A channel policy announcement seen on the network graph
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelEdgeUpdate {
    pub chan_id: u64,
    pub chan_point: String,
    pub capacity: i64,
    pub advertising_node: String,
    pub connecting_node: String,
    pub routing_policy: Option<RoutingPolicy>,
}
