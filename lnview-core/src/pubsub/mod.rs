//! Turns subscriptions and periodic snapshots into a stream of [`Event`]s,
//! while feeding the live collections.
//!
//! Every loop runs as a task of one [`JoinSet`].  [`PubSub::stop`] fires the
//! shutdown trigger, waits for every task, and only then drops the last event
//! sender, which closes the event queue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::*;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time;
use triggered::{Listener, Trigger};

use crate::events::Event;
use crate::model::ChannelEdgeUpdate;
use crate::source::{DataSource, Result, Update};
use crate::state::Models;

mod probe;

pub use probe::{ChannelBalanceProbe, InfoProbe, Probe, WalletBalanceProbe};

// capacity of the queue between a subscription and its forwarder
const UPDATE_QUEUE_SIZE: usize = 16;

#[derive(Clone, Debug)]
pub struct PubSubConfig {
    /// Interval between two probe rounds
    pub tick_interval: Duration,
    /// Also diff the on-chain wallet balance
    pub wallet_probe: bool,
    /// Capacity of the event queue; producers wait when it is full
    pub queue_size: usize,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        PubSubConfig { tick_interval: Duration::from_secs(3), wallet_probe: false, queue_size: 64 }
    }
}

/// Sends events unless shutdown was signalled
#[derive(Clone)]
struct Emitter {
    sender: mpsc::Sender<Event>,
    shutdown: Listener,
}

impl Emitter {
    // Returns false if the event was not delivered and the caller should stop
    async fn emit(&self, event: Event) -> bool {
        if self.shutdown.is_triggered() {
            return false;
        }
        trace!("pubsub: emit {}", event);
        tokio::select! {
            biased;
            _ = self.shutdown.clone() => false,
            result = self.sender.send(event) => result.is_ok(),
        }
    }
}

pub struct PubSub {
    models: Arc<Models>,
    config: PubSubConfig,
    shutdown_trigger: Trigger,
    shutdown_signal: Listener,
    sender: Option<mpsc::Sender<Event>>,
    tasks: JoinSet<()>,
}

impl PubSub {
    /// Create the engine and the receiving end of its event queue
    pub fn new(models: Arc<Models>, config: PubSubConfig) -> (PubSub, mpsc::Receiver<Event>) {
        let (sender, receiver) = mpsc::channel(config.queue_size.max(1));
        let (shutdown_trigger, shutdown_signal) = triggered::trigger();
        let pubsub = PubSub {
            models,
            config,
            shutdown_trigger,
            shutdown_signal,
            sender: Some(sender),
            tasks: JoinSet::new(),
        };
        (pubsub, receiver)
    }

    /// A trigger that stops all loops, e.g. from a signal handler
    pub fn shutdown_trigger(&self) -> Trigger {
        self.shutdown_trigger.clone()
    }

    fn probes(&self) -> Vec<Box<dyn Probe>> {
        let mut probes: Vec<Box<dyn Probe>> =
            vec![Box::new(InfoProbe::new()), Box::new(ChannelBalanceProbe::new())];
        if self.config.wallet_probe {
            probes.push(Box::new(WalletBalanceProbe::new()));
        }
        probes
    }

    /// Start the subscription loops and the ticker
    pub fn run(&mut self) {
        let sender = match self.sender.as_ref() {
            Some(sender) => sender.clone(),
            None => {
                warn!("pubsub: run after stop");
                return;
            }
        };
        let emitter = Emitter { sender, shutdown: self.shutdown_signal.clone() };
        let source = self.models.source();
        info!("{} pubsub: starting", source.log_prefix());

        let (models, emitter_clone, shutdown) =
            (self.models.clone(), emitter.clone(), self.shutdown_signal.clone());
        self.tasks.spawn(async move {
            let source = models.source();
            let (tx, rx) = mpsc::channel(UPDATE_QUEUE_SIZE);
            let subscription = source.subscribe_invoices(shutdown, tx);
            forward("invoices", subscription, rx, &emitter_clone, |update| match update {
                Update::Invoice(invoice) => {
                    models.received.write().unwrap().add(invoice.clone());
                    if invoice.is_settled() {
                        Some(Event::InvoiceSettled(invoice))
                    } else {
                        Some(Event::InvoiceCreated(invoice))
                    }
                }
                other => unexpected("invoices", other),
            })
            .await;
        });

        let (models, emitter_clone, shutdown) =
            (self.models.clone(), emitter.clone(), self.shutdown_signal.clone());
        self.tasks.spawn(async move {
            let source = models.source();
            let (tx, rx) = mpsc::channel(UPDATE_QUEUE_SIZE);
            let subscription = source.subscribe_transactions(shutdown, tx);
            forward("transactions", subscription, rx, &emitter_clone, |update| match update {
                Update::Transaction(transaction) => Some(Event::TransactionCreated(transaction)),
                other => unexpected("transactions", other),
            })
            .await;
        });

        let (models, emitter_clone, shutdown) =
            (self.models.clone(), emitter.clone(), self.shutdown_signal.clone());
        self.tasks.spawn(async move {
            let source = models.source();
            let (tx, rx) = mpsc::channel(UPDATE_QUEUE_SIZE);
            let subscription = source.subscribe_routing_events(shutdown, tx);
            forward("routing", subscription, rx, &emitter_clone, |update| match update {
                Update::Routing(event) => {
                    models.routing_log.write().unwrap().insert(event);
                    None
                }
                other => unexpected("routing", other),
            })
            .await;
        });

        let (models, emitter_clone, shutdown) =
            (self.models.clone(), emitter.clone(), self.shutdown_signal.clone());
        self.tasks.spawn(async move {
            let source = models.source();
            let (tx, rx) = mpsc::channel(UPDATE_QUEUE_SIZE);
            let subscription = source.subscribe_graph(shutdown, tx);
            forward("graph", subscription, rx, &emitter_clone, |update| match update {
                Update::ChannelEdge(edge) => {
                    apply_edge(&models, edge);
                    None
                }
                other => unexpected("graph", other),
            })
            .await;
        });

        let probes = self.probes();
        let interval = self.config.tick_interval;
        let shutdown = self.shutdown_signal.clone();
        self.tasks.spawn(ticker(source, probes, interval, emitter, shutdown));
    }

    /// Stop every loop and wait for them to finish.  The event queue is
    /// closed once this returns and the receiver has drained it.
    pub async fn stop(&mut self) {
        info!("pubsub: stopping");
        self.shutdown_trigger.trigger();
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                error!("pubsub: task failed: {}", e);
            }
        }
        self.sender = None;
        info!("pubsub: stopped");
    }
}

fn unexpected(name: &str, update: Update) -> Option<Event> {
    warn!("pubsub: {}: dropping unexpected {} update", name, update.kind());
    None
}

// Apply a policy announcement to the channel it concerns, if we know it
fn apply_edge(models: &Models, edge: ChannelEdgeUpdate) {
    let policy = match edge.routing_policy {
        Some(policy) => policy,
        None => return,
    };
    let own_pubkey = models.info.read().unwrap().pub_key.clone();
    let mut channels = models.channels.write().unwrap();
    let mut channel = match channels.get_by_chan_point(&edge.chan_point) {
        Some(channel) => channel.clone(),
        None => return,
    };
    debug!("pubsub: graph: policy update for {}", edge.chan_point);
    if !own_pubkey.is_empty() && edge.advertising_node == own_pubkey {
        channel.local_policy = Some(policy);
    } else {
        channel.remote_policy = Some(policy);
    }
    channels.update(channel);
}

/// Drain a subscription's queue until the subscription ends, handing every
/// update to `handle` and emitting the event it returns.
async fn forward<S, H>(
    name: &'static str,
    subscription: S,
    mut receiver: mpsc::Receiver<Update>,
    emitter: &Emitter,
    mut handle: H,
) where
    S: Future<Output = Result<()>>,
    H: FnMut(Update) -> Option<Event>,
{
    let drain = async move {
        while let Some(update) = receiver.recv().await {
            if let Some(event) = handle(update) {
                if !emitter.emit(event).await {
                    break;
                }
            }
        }
        // dropping the receiver unblocks a subscription waiting to send
    };
    let (result, ()) = tokio::join!(subscription, drain);
    match result {
        Ok(()) => info!("pubsub: {} subscription ended", name),
        Err(e) if e.is_cancelled() => info!("pubsub: {} subscription cancelled", name),
        Err(e) => error!("pubsub: {} subscription failed: {}", name, e),
    }
}

async fn ticker(
    source: Arc<dyn DataSource>,
    mut probes: Vec<Box<dyn Probe>>,
    interval: Duration,
    emitter: Emitter,
    shutdown: Listener,
) {
    let mut interval = time::interval(interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.clone() => break,
        }
        for probe in probes.iter_mut() {
            let result = tokio::select! {
                result = probe.probe(source.as_ref()) => result,
                _ = shutdown.clone() => break,
            };
            match result {
                Ok(events) =>
                    for event in events {
                        if !emitter.emit(event).await {
                            info!("pubsub: ticker stopped");
                            return;
                        }
                    },
                Err(e) =>
                    warn!("{} pubsub: {} probe failed: {}", source.log_prefix(), probe.name(), e),
            }
        }
        if shutdown.is_triggered() {
            break;
        }
    }
    info!("pubsub: ticker stopped");
}
