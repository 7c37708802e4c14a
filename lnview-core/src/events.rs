use core::fmt::{self, Display, Formatter};

use crate::model::{Invoice, Transaction};

/// A discrete change detected on the remote node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    BlockReceived,
    PeerUpdated,
    ChannelPending,
    ChannelActive,
    ChannelInactive,
    ChannelBalanceUpdated,
    InvoiceCreated(Invoice),
    InvoiceSettled(Invoice),
    TransactionCreated(Transaction),
    WalletBalanceUpdated,
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Event::BlockReceived => write!(f, "block received"),
            Event::PeerUpdated => write!(f, "peer updated"),
            Event::ChannelPending => write!(f, "channel pending"),
            Event::ChannelActive => write!(f, "channel active"),
            Event::ChannelInactive => write!(f, "channel inactive"),
            Event::ChannelBalanceUpdated => write!(f, "channel balance updated"),
            Event::InvoiceCreated(i) => write!(f, "invoice created {}", i.payment_hash()),
            Event::InvoiceSettled(i) => write!(f, "invoice settled {}", i.payment_hash()),
            Event::TransactionCreated(t) => write!(f, "transaction created {}", t.tx_hash),
            Event::WalletBalanceUpdated => write!(f, "wallet balance updated"),
        }
    }
}
