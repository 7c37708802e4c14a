//! A scripted in-memory data source for tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use triggered::Listener;

use super::{DataSource, Error, ListChannelsOptions, Result, Update};
use crate::model::{
    Channel, ChannelBalance, Info, Invoice, InvoiceState, PayReq, Payment, PaymentStatus,
    Transaction, WalletBalance,
};

struct State {
    infos: VecDeque<Result<Info>>,
    channel_balances: VecDeque<Result<ChannelBalance>>,
    wallet_balances: VecDeque<Result<WalletBalance>>,
    channels: Result<Vec<Channel>>,
    details: HashMap<String, Channel>,
    transactions: Vec<Transaction>,
    invoices: Vec<Invoice>,
    detail_calls: Vec<String>,
}

// Snapshot scripts advance one entry per call and keep repeating the last one
fn next<T: Clone>(queue: &mut VecDeque<Result<T>>) -> Result<T> {
    if queue.len() > 1 {
        queue.pop_front().expect("non-empty")
    } else {
        queue.front().cloned().unwrap_or_else(|| Err(Error::Rpc("no data scripted".to_string())))
    }
}

struct Feed {
    sender: mpsc::UnboundedSender<Update>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<Update>>,
    failure: Mutex<Option<Error>>,
}

impl Feed {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Feed { sender, receiver: tokio::sync::Mutex::new(receiver), failure: Mutex::new(None) }
    }
}

/// Tracks a running subscription
struct Active<'a>(&'a AtomicUsize);

impl<'a> Active<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Active(counter)
    }
}

impl Drop for Active<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Feeds: invoices, transactions, graph, routing
pub struct MockSource {
    state: Mutex<State>,
    invoices: Feed,
    transactions: Feed,
    graph: Feed,
    routing: Feed,
    active: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        MockSource {
            state: Mutex::new(State {
                infos: VecDeque::new(),
                channel_balances: VecDeque::new(),
                wallet_balances: VecDeque::new(),
                channels: Ok(Vec::new()),
                details: HashMap::new(),
                transactions: Vec::new(),
                invoices: Vec::new(),
                detail_calls: Vec::new(),
            }),
            invoices: Feed::new(),
            transactions: Feed::new(),
            graph: Feed::new(),
            routing: Feed::new(),
            active: AtomicUsize::new(0),
        }
    }

    pub fn push_info(&self, info: Result<Info>) {
        self.state.lock().unwrap().infos.push_back(info);
    }

    pub fn push_channel_balance(&self, balance: Result<ChannelBalance>) {
        self.state.lock().unwrap().channel_balances.push_back(balance);
    }

    pub fn push_wallet_balance(&self, balance: Result<WalletBalance>) {
        self.state.lock().unwrap().wallet_balances.push_back(balance);
    }

    pub fn set_channels(&self, channels: Result<Vec<Channel>>) {
        self.state.lock().unwrap().channels = channels;
    }

    /// Set the answer to a detail re-fetch of a channel
    pub fn set_channel_detail(&self, channel: Channel) {
        self.state.lock().unwrap().details.insert(channel.chan_point.clone(), channel);
    }

    pub fn set_transactions(&self, transactions: Vec<Transaction>) {
        self.state.lock().unwrap().transactions = transactions;
    }

    pub fn set_invoices(&self, invoices: Vec<Invoice>) {
        self.state.lock().unwrap().invoices = invoices;
    }

    /// Channel points passed to `get_channel`, in call order
    pub fn detail_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().detail_calls.clone()
    }

    pub fn push_invoice_update(&self, update: Update) {
        let _ = self.invoices.sender.send(update);
    }

    pub fn push_transaction_update(&self, update: Update) {
        let _ = self.transactions.sender.send(update);
    }

    pub fn push_graph_update(&self, update: Update) {
        let _ = self.graph.sender.send(update);
    }

    pub fn push_routing_update(&self, update: Update) {
        let _ = self.routing.sender.send(update);
    }

    /// Make the next routing subscription fail immediately
    pub fn fail_routing_subscription(&self, error: Error) {
        *self.routing.failure.lock().unwrap() = Some(error);
    }

    /// Number of subscriptions currently running
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    async fn forward(
        &self,
        feed: &Feed,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()> {
        let failure = feed.failure.lock().unwrap().take();
        if let Some(error) = failure {
            return Err(error);
        }
        let _active = Active::enter(&self.active);
        let mut receiver = feed.receiver.lock().await;
        loop {
            tokio::select! {
                _ = shutdown.clone() => return Err(Error::Cancelled),
                item = receiver.recv() => match item {
                    Some(update) =>
                        if sender.send(update).await.is_err() {
                            return Ok(());
                        },
                    None => return Ok(()),
                },
            }
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for MockSource {
    fn log_prefix(&self) -> String {
        "mock".to_string()
    }

    async fn info(&self) -> Result<Info> {
        next(&mut self.state.lock().unwrap().infos)
    }

    async fn list_channels(&self, options: ListChannelsOptions) -> Result<Vec<Channel>> {
        let state = self.state.lock().unwrap();
        let channels = state.channels.clone()?;
        Ok(channels.into_iter().filter(|c| options.accepts(c)).collect())
    }

    async fn get_channel(&self, channel: &Channel) -> Result<Channel> {
        let mut state = self.state.lock().unwrap();
        state.detail_calls.push(channel.chan_point.clone());
        state
            .details
            .get(&channel.chan_point)
            .cloned()
            .ok_or_else(|| Error::Rpc(format!("unknown channel {}", channel.chan_point)))
    }

    async fn wallet_balance(&self) -> Result<WalletBalance> {
        next(&mut self.state.lock().unwrap().wallet_balances)
    }

    async fn channel_balance(&self) -> Result<ChannelBalance> {
        next(&mut self.state.lock().unwrap().channel_balances)
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.state.lock().unwrap().transactions.clone())
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.state.lock().unwrap().invoices.clone())
    }

    async fn decode_pay_req(&self, pay_req: &str) -> Result<PayReq> {
        if pay_req.is_empty() {
            return Err(Error::Malformed("empty payment request".to_string()));
        }
        Ok(PayReq { string: pay_req.to_string(), ..Default::default() })
    }

    async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice> {
        let created = Invoice { state: InvoiceState::Open, ..invoice.clone() };
        self.state.lock().unwrap().invoices.push(created.clone());
        Ok(created)
    }

    async fn lookup_invoice(&self, r_hash: &[u8]) -> Result<Invoice> {
        let state = self.state.lock().unwrap();
        state
            .invoices
            .iter()
            .find(|i| i.r_hash == r_hash)
            .cloned()
            .ok_or_else(|| Error::Rpc("invoice not found".to_string()))
    }

    async fn send_payment(&self, pay_req: &PayReq) -> Result<Payment> {
        Ok(Payment {
            pay_req: pay_req.clone(),
            amount: pay_req.amount,
            status: PaymentStatus::Succeeded,
            ..Default::default()
        })
    }

    async fn subscribe_invoices(
        &self,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()> {
        self.forward(&self.invoices, shutdown, sender).await
    }

    async fn subscribe_transactions(
        &self,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()> {
        self.forward(&self.transactions, shutdown, sender).await
    }

    async fn subscribe_graph(&self, shutdown: Listener, sender: mpsc::Sender<Update>) -> Result<()> {
        self.forward(&self.graph, shutdown, sender).await
    }

    async fn subscribe_routing_events(
        &self,
        shutdown: Listener,
        sender: mpsc::Sender<Update>,
    ) -> Result<()> {
        self.forward(&self.routing, shutdown, sender).await
    }
}
