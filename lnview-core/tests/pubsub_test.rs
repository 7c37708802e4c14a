//! Drives the event engine against the scripted source.

use std::sync::Arc;
use std::time::Duration;

use test_log::test;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use lnview_core::model::{
    Channel, ChannelBalance, ChannelEdgeUpdate, ChannelStatus, Info, Invoice, InvoiceState,
    RoutingEvent, RoutingPolicy, RoutingStatus, Transaction,
};
use lnview_core::source::mock::MockSource;
use lnview_core::source::{Error, Update};
use lnview_core::{Event, Models, ModelsConfig, PubSub, PubSubConfig};

const WAIT: Duration = Duration::from_secs(5);

fn setup(config: PubSubConfig) -> (Arc<MockSource>, Arc<Models>, PubSub, mpsc::Receiver<Event>) {
    let source = Arc::new(MockSource::new());
    let models = Arc::new(Models::new(source.clone(), ModelsConfig::default()));
    let (pubsub, receiver) = PubSub::new(models.clone(), config);
    (source, models, pubsub, receiver)
}

fn quiet() -> PubSubConfig {
    PubSubConfig { tick_interval: Duration::from_secs(3600), ..Default::default() }
}

fn invoice(hash: u8, state: InvoiceState) -> Invoice {
    Invoice { r_hash: vec![hash], value: 1000, state, ..Default::default() }
}

async fn next_event(receiver: &mut mpsc::Receiver<Event>) -> Event {
    timeout(WAIT, receiver.recv()).await.expect("timed out waiting for event").expect("queue closed")
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    timeout(WAIT, async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never held")
}

async fn drain(receiver: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = timeout(WAIT, receiver.recv()).await.expect("queue never closed") {
        events.push(event);
    }
    events
}

#[test(tokio::test)]
async fn invoice_and_transaction_events_test() {
    let (source, models, mut pubsub, mut receiver) = setup(quiet());
    pubsub.run();

    source.push_invoice_update(Update::Invoice(invoice(1, InvoiceState::Open)));
    assert_eq!(next_event(&mut receiver).await, Event::InvoiceCreated(invoice(1, InvoiceState::Open)));
    assert!(models.received.read().unwrap().is_empty());

    let settled = Invoice { settle_date: 1_700_000_000, ..invoice(2, InvoiceState::Settled) };
    source.push_invoice_update(Update::Invoice(settled.clone()));
    assert_eq!(next_event(&mut receiver).await, Event::InvoiceSettled(settled));
    assert!(models.received.read().unwrap().contains("02"));

    let transaction = Transaction { tx_hash: "ab".to_string(), amount: 5000, ..Default::default() };
    source.push_transaction_update(Update::Transaction(transaction.clone()));
    assert_eq!(next_event(&mut receiver).await, Event::TransactionCreated(transaction));

    pubsub.stop().await;
    assert_eq!(source.active_subscriptions(), 0);
    assert!(drain(&mut receiver).await.is_empty());
}

#[test(tokio::test)]
async fn unexpected_update_dropped_test() {
    let (source, _models, mut pubsub, mut receiver) = setup(quiet());
    pubsub.run();

    source.push_invoice_update(Update::Transaction(Transaction::default()));
    source.push_invoice_update(Update::Invoice(invoice(3, InvoiceState::Open)));
    assert_eq!(next_event(&mut receiver).await, Event::InvoiceCreated(invoice(3, InvoiceState::Open)));

    pubsub.stop().await;
    assert!(drain(&mut receiver).await.is_empty());
}

#[test(tokio::test)]
async fn routing_and_graph_feed_models_test() {
    let (source, models, mut pubsub, mut receiver) = setup(quiet());
    models.info.write().unwrap().pub_key = "me".to_string();
    models.channels.write().unwrap().add(Channel {
        id: 1 << 40,
        chan_point: "a:0".to_string(),
        status: ChannelStatus::Active,
        ..Default::default()
    });
    pubsub.run();

    let forward = RoutingEvent {
        incoming_channel_id: 1,
        outgoing_channel_id: 2,
        amount_msat: 10_000,
        status: RoutingStatus::Active,
        ..Default::default()
    };
    source.push_routing_update(Update::Routing(forward.clone()));
    source.push_routing_update(Update::Routing(RoutingEvent {
        status: RoutingStatus::Settled,
        last_update: 2,
        ..forward
    }));
    wait_until(|| {
        let log = models.routing_log.read().unwrap();
        log.len() == 1 && log.get(0).map(|e| e.status) == Some(RoutingStatus::Settled)
    })
    .await;

    let policy = RoutingPolicy { fee_base_msat: 1000, ..Default::default() };
    let edge = |advertising_node: &str| ChannelEdgeUpdate {
        chan_point: "a:0".to_string(),
        advertising_node: advertising_node.to_string(),
        routing_policy: Some(policy.clone()),
        ..Default::default()
    };
    source.push_graph_update(Update::ChannelEdge(edge("me")));
    source.push_graph_update(Update::ChannelEdge(edge("them")));
    // unknown channels are ignored
    source.push_graph_update(Update::ChannelEdge(ChannelEdgeUpdate {
        chan_point: "z:9".to_string(),
        ..edge("them")
    }));
    wait_until(|| {
        let channels = models.channels.read().unwrap();
        let channel = channels.get_by_chan_point("a:0").unwrap();
        channel.local_policy.is_some() && channel.remote_policy.is_some()
    })
    .await;
    assert_eq!(models.channels.read().unwrap().len(), 1);

    pubsub.stop().await;
    // neither loop emits events
    assert!(drain(&mut receiver).await.is_empty());
}

#[test(tokio::test)]
async fn probe_events_test() {
    let config = PubSubConfig { tick_interval: Duration::from_millis(20), ..Default::default() };
    let (source, _models, mut pubsub, mut receiver) = setup(config);
    let info = |num_peers, block_height| Info { num_peers, block_height, ..Default::default() };
    source.push_info(Ok(info(5, 100)));
    source.push_info(Ok(info(5, 100)));
    source.push_info(Ok(info(7, 101)));
    source.push_info(Ok(info(6, 101)));
    source.push_channel_balance(Ok(ChannelBalance { balance: 10, ..Default::default() }));
    source.push_channel_balance(Ok(ChannelBalance { balance: 20, ..Default::default() }));
    pubsub.run();

    let mut events = Vec::new();
    for _ in 0..4 {
        events.push(next_event(&mut receiver).await);
    }
    assert_eq!(
        events,
        vec![
            Event::ChannelBalanceUpdated,
            Event::BlockReceived,
            Event::PeerUpdated,
            Event::PeerUpdated
        ]
    );
    // the scripts now repeat their last snapshot
    assert!(timeout(Duration::from_millis(200), receiver.recv()).await.is_err());

    pubsub.stop().await;
    assert!(drain(&mut receiver).await.is_empty());
}

#[test(tokio::test)]
async fn failed_subscription_isolated_test() {
    let (source, _models, mut pubsub, mut receiver) = setup(quiet());
    source.fail_routing_subscription(Error::Connection("refused".to_string()));
    pubsub.run();

    wait_until(|| source.active_subscriptions() == 3).await;
    source.push_invoice_update(Update::Invoice(invoice(4, InvoiceState::Open)));
    assert_eq!(next_event(&mut receiver).await, Event::InvoiceCreated(invoice(4, InvoiceState::Open)));

    pubsub.stop().await;
    assert_eq!(source.active_subscriptions(), 0);
}

#[test(tokio::test)]
async fn stop_with_full_queue_test() {
    let config = PubSubConfig { queue_size: 1, ..quiet() };
    let (source, _models, mut pubsub, mut receiver) = setup(config);
    pubsub.run();

    for hash in 1..=3 {
        source.push_invoice_update(Update::Invoice(invoice(hash, InvoiceState::Open)));
    }
    // the first event fills the queue and the forwarder blocks on the second
    sleep(Duration::from_millis(100)).await;
    timeout(WAIT, pubsub.stop()).await.expect("stop hung on a full queue");
    assert_eq!(source.active_subscriptions(), 0);

    source.push_invoice_update(Update::Invoice(invoice(9, InvoiceState::Open)));
    assert_eq!(drain(&mut receiver).await, vec![Event::InvoiceCreated(invoice(1, InvoiceState::Open))]);
}

#[test(tokio::test)]
async fn external_trigger_test() {
    let (source, _models, mut pubsub, mut receiver) = setup(quiet());
    let trigger = pubsub.shutdown_trigger();
    pubsub.run();
    wait_until(|| source.active_subscriptions() == 4).await;

    // the loops wind down on the trigger alone
    trigger.trigger();
    wait_until(|| source.active_subscriptions() == 0).await;
    source.push_invoice_update(Update::Invoice(invoice(5, InvoiceState::Open)));

    timeout(WAIT, pubsub.stop()).await.expect("stop hung");
    assert!(drain(&mut receiver).await.is_empty());
}
