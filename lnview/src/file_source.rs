//! A data source backed by a JSON snapshot of a node.
//!
//! The file is read again on every snapshot call, so editing it simulates
//! a live node.  Subscriptions never push anything.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use triggered::Listener;

use lnview_core::model::{
    Channel, ChannelBalance, Info, Invoice, PayReq, Payment, Transaction, WalletBalance,
};
use lnview_core::source::{DataSource, Error, ListChannelsOptions, Result, Update};

/// The content of a snapshot file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub info: Info,
    pub wallet_balance: WalletBalance,
    pub channel_balance: ChannelBalance,
    pub channels: Vec<Channel>,
    pub transactions: Vec<Transaction>,
    pub invoices: Vec<Invoice>,
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSource { path: path.as_ref().to_path_buf() }
    }

    async fn load(&self) -> Result<Snapshot> {
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::Connection(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_slice(&contents)
            .map_err(|e| Error::Malformed(format!("{}: {}", self.path.display(), e)))
    }

    fn unsupported(&self, what: &str) -> Error {
        Error::Rpc(format!("{} is not supported by a snapshot file", what))
    }

    // Wait until shutdown or until nobody listens anymore
    async fn idle(&self, name: &str, shutdown: Listener, sender: mpsc::Sender<Update>) -> Result<()> {
        debug!("{} {} subscription idle", self.log_prefix(), name);
        tokio::select! {
            _ = shutdown => Err(Error::Cancelled),
            _ = sender.closed() => Ok(()),
        }
    }
}

#[async_trait]
impl DataSource for FileSource {
    fn log_prefix(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn info(&self) -> Result<Info> {
        Ok(self.load().await?.info)
    }

    async fn list_channels(&self, options: ListChannelsOptions) -> Result<Vec<Channel>> {
        let channels = self.load().await?.channels;
        Ok(channels.into_iter().filter(|c| options.accepts(c)).collect())
    }

    async fn get_channel(&self, channel: &Channel) -> Result<Channel> {
        self.load()
            .await?
            .channels
            .into_iter()
            .find(|c| c.chan_point == channel.chan_point)
            .ok_or_else(|| Error::Rpc(format!("unknown channel {}", channel.chan_point)))
    }

    async fn wallet_balance(&self) -> Result<WalletBalance> {
        Ok(self.load().await?.wallet_balance)
    }

    async fn channel_balance(&self) -> Result<ChannelBalance> {
        Ok(self.load().await?.channel_balance)
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.load().await?.transactions)
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.load().await?.invoices)
    }

    async fn decode_pay_req(&self, _pay_req: &str) -> Result<PayReq> {
        Err(self.unsupported("decoding a payment request"))
    }

    async fn create_invoice(&self, _invoice: &Invoice) -> Result<Invoice> {
        Err(self.unsupported("creating an invoice"))
    }

    async fn lookup_invoice(&self, r_hash: &[u8]) -> Result<Invoice> {
        self.load()
            .await?
            .invoices
            .into_iter()
            .find(|i| i.r_hash == r_hash)
            .ok_or_else(|| Error::Rpc("invoice not found".to_string()))
    }

    async fn send_payment(&self, _pay_req: &PayReq) -> Result<Payment> {
        Err(self.unsupported("sending a payment"))
    }

    async fn subscribe_invoices(
        &self,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()> {
        self.idle("invoices", shutdown, sender).await
    }

    async fn subscribe_transactions(
        &self,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()> {
        self.idle("transactions", shutdown, sender).await
    }

    async fn subscribe_graph(&self, shutdown: Listener, sender: mpsc::Sender<Update>) -> Result<()> {
        self.idle("graph", shutdown, sender).await
    }

    async fn subscribe_routing_events(
        &self,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()> {
        self.idle("routing", shutdown, sender).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lnview_core::model::{ChannelStatus, InvoiceState};
    use std::io::Write;
    use std::time::Duration;
    use test_log::test;

    const SNAPSHOT: &str = r#"{
        "info": { "alias": "alice", "num_peers": 2, "block_height": 800000 },
        "channel_balance": { "balance": 150000 },
        "channels": [
            { "id": 879609302220800000, "chan_point": "aa:0", "status": "Active", "capacity": 200000 },
            { "chan_point": "bb:1", "status": "Opening", "private": true }
        ],
        "invoices": [
            { "r_hash": "0102", "state": "Settled", "value": 1000, "settle_date": 1700000000 }
        ]
    }"#;

    fn snapshot_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test(tokio::test)]
    async fn snapshot_calls_test() {
        let file = snapshot_file(SNAPSHOT);
        let source = FileSource::new(file.path());

        let info = source.info().await.unwrap();
        assert_eq!(info.alias, "alice");
        assert_eq!(info.num_peers, 2);
        assert_eq!(source.channel_balance().await.unwrap().balance, 150_000);
        assert_eq!(source.wallet_balance().await.unwrap(), WalletBalance::default());
        assert!(source.list_transactions().await.unwrap().is_empty());

        let channels = source.list_channels(ListChannelsOptions::default()).await.unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].short_channel_id().as_deref(), Some("800000x0x0"));
        let pending = ListChannelsOptions { pending_only: true, ..Default::default() };
        let channels = source.list_channels(pending).await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].status, ChannelStatus::Opening);

        let detail = source.get_channel(&channels[0]).await.unwrap();
        assert!(detail.private);
        let unknown = Channel { chan_point: "cc:2".to_string(), ..Default::default() };
        assert!(matches!(source.get_channel(&unknown).await, Err(Error::Rpc(_))));

        let invoice = source.lookup_invoice(&[1, 2]).await.unwrap();
        assert_eq!(invoice.state, InvoiceState::Settled);
        assert!(source.send_payment(&PayReq::default()).await.is_err());
    }

    #[test(tokio::test)]
    async fn rereads_file_test() {
        let file = snapshot_file(SNAPSHOT);
        let source = FileSource::new(file.path());
        assert_eq!(source.info().await.unwrap().num_peers, 2);

        std::fs::write(file.path(), r#"{ "info": { "num_peers": 3 } }"#).unwrap();
        assert_eq!(source.info().await.unwrap().num_peers, 3);
    }

    #[test(tokio::test)]
    async fn load_errors_test() {
        let file = snapshot_file("{ not json");
        let source = FileSource::new(file.path());
        assert!(matches!(source.info().await, Err(Error::Malformed(_))));

        let source = FileSource::new("/nonexistent/snapshot.json");
        assert!(matches!(source.info().await, Err(Error::Connection(_))));
    }

    #[test(tokio::test)]
    async fn subscription_idles_until_cancelled_test() {
        let source = FileSource::new("/nonexistent/snapshot.json");
        let (trigger, shutdown) = triggered::trigger();
        let (sender, mut receiver) = mpsc::channel(1);
        let subscription = source.subscribe_invoices(shutdown, sender);
        tokio::pin!(subscription);

        assert!(tokio::time::timeout(Duration::from_millis(50), &mut subscription).await.is_err());
        trigger.trigger();
        assert_eq!(subscription.await, Err(Error::Cancelled));
        assert!(receiver.recv().await.is_none());
    }
}
