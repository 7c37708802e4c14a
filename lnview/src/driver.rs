//! Keeps the collections fresh and consumes the event queue, in place of a
//! terminal front end.

use std::sync::Arc;
use std::time::Duration;

use log::*;
use tokio::sync::mpsc;
use tokio::time;
use triggered::Listener;

use lnview_core::model::ChannelStatus;
use lnview_core::{Event, Models, PubSub, PubSubConfig};

pub struct Driver {
    models: Arc<Models>,
    pubsub: PubSub,
    events: mpsc::Receiver<Event>,
    refresh_interval: Duration,
}

impl Driver {
    pub fn new(models: Arc<Models>, config: PubSubConfig, refresh_interval: Duration) -> Self {
        let (pubsub, events) = PubSub::new(models.clone(), config);
        Driver { models, pubsub, events, refresh_interval }
    }

    /// Run until `shutdown` fires, then stop the engine and drain the
    /// remaining events.  Returns the number of events consumed.
    pub async fn run(mut self, shutdown: Listener) -> usize {
        let prefix = self.models.source().log_prefix();
        if let Err(e) = self.models.refresh_received().await {
            warn!("{} loading received invoices failed: {}", prefix, e);
        }
        self.pubsub.run();

        let mut seen = 0;
        let mut interval = time::interval(self.refresh_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.clone() => break,
                _ = interval.tick() => {
                    self.models.refresh_all().await;
                    debug!("{}", summary(&self.models));
                }
                event = self.events.recv() => match event {
                    Some(event) => {
                        seen += 1;
                        self.handle(&event);
                    }
                    None => break,
                },
            }
        }

        info!("driver: shutting down");
        self.pubsub.stop().await;
        while let Some(event) = self.events.recv().await {
            seen += 1;
            self.handle(&event);
        }
        info!("driver: done after {} events", seen);
        seen
    }

    fn handle(&self, event: &Event) {
        info!("event: {}", event);
        info!("{}", summary(&self.models));
    }
}

/// One line describing the collections
pub fn summary(models: &Models) -> String {
    let info = models.info.read().unwrap();
    let channels = models.channels.read().unwrap();
    let active = channels.list().iter().filter(|c| c.status == ChannelStatus::Active).count();
    let balance = models.channels_balance.read().unwrap().balance;
    format!(
        "height {} peers {} channels {} ({} active) balance {} routing {} received {} transactions {}",
        info.block_height,
        info.num_peers,
        channels.len(),
        active,
        balance,
        models.routing_log.read().unwrap().len(),
        models.received.read().unwrap().len(),
        models.transactions.read().unwrap().len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lnview_core::model::{Channel, ChannelBalance, Info, Invoice, InvoiceState};
    use lnview_core::source::mock::MockSource;
    use lnview_core::source::Update;
    use lnview_core::ModelsConfig;
    use test_log::test;
    use tokio::time::{sleep, timeout};

    fn settled(hash: u8) -> Invoice {
        Invoice { r_hash: vec![hash], state: InvoiceState::Settled, value: 10, ..Default::default() }
    }

    #[test(tokio::test)]
    async fn driver_test() {
        let source = Arc::new(MockSource::new());
        source.push_info(Ok(Info { alias: "alice".to_string(), num_peers: 3, ..Default::default() }));
        source.push_channel_balance(Ok(ChannelBalance { balance: 42, ..Default::default() }));
        source.set_channels(Ok(vec![Channel {
            chan_point: "aa:0".to_string(),
            status: ChannelStatus::Active,
            ..Default::default()
        }]));
        source.set_invoices(vec![settled(1)]);
        let models = Arc::new(Models::new(source.clone(), ModelsConfig::default()));

        let config = PubSubConfig { tick_interval: Duration::from_secs(3600), ..Default::default() };
        let driver = Driver::new(models.clone(), config, Duration::from_millis(10));
        let (trigger, shutdown) = triggered::trigger();
        let handle = tokio::spawn(driver.run(shutdown));

        source.push_invoice_update(Update::Invoice(settled(2)));
        timeout(Duration::from_secs(5), async {
            while models.received.read().unwrap().len() < 2 || models.info.read().unwrap().num_peers != 3
            {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(
            summary(&models),
            "height 0 peers 3 channels 1 (1 active) balance 42 routing 0 received 2 transactions 0"
        );

        trigger.trigger();
        let seen = timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(seen, 1);
        assert_eq!(source.active_subscriptions(), 0);
    }
}
