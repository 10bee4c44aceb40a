//! Process wiring: broker, generator, adapter and consumer.

use std::sync::Arc;

use shared_bus::{InMemoryBroker, InMemoryTransport, Role, Transport};
use sq_01_feed_adapter::{DataProvider, FeedAdapter, FeedStatus};
use sq_02_feed_generator::{FeedSimulator, Generator};
use tokio::runtime::Handle;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::consumer::LoggingConsumer;
use crate::error::RuntimeError;

pub struct FeedRuntime {
    config: RuntimeConfig,
    broker: Arc<InMemoryBroker>,
    generator: Arc<Generator>,
    adapter: Arc<FeedAdapter<LoggingConsumer>>,
    consumer: Arc<LoggingConsumer>,
}

impl FeedRuntime {
    /// Build every component. Nothing connects until `start`.
    pub fn build(config: RuntimeConfig, runtime: Handle) -> Result<Self, RuntimeError> {
        config.validate()?;

        let broker = Arc::new(InMemoryBroker::new());
        broker.declare(&config.bus.queue_name);
        broker.declare(&config.bus.topic_name);

        let endpoint = |role: Role| -> Arc<dyn Transport> {
            Arc::new(InMemoryTransport::new(
                Arc::clone(&broker),
                role,
                config.bus.queue_name.clone(),
                config.bus.topic_name.clone(),
                runtime.clone(),
            ))
        };

        let generator_config = config.generator_config();
        let simulator = Arc::new(FeedSimulator::new(
            generator_config.tick_interval,
            generator_config.seed,
        ));
        let generator = Generator::new(
            generator_config,
            endpoint(Role::Generator),
            simulator,
            runtime.clone(),
        )?;

        let consumer = Arc::new(LoggingConsumer::new());
        let adapter = FeedAdapter::new(
            config.adapter_config(),
            endpoint(Role::Adapter),
            Arc::clone(&consumer),
            runtime,
        )?;

        Ok(Self {
            config,
            broker,
            generator,
            adapter,
            consumer,
        })
    }

    /// Start both sides and subscribe the configured items.
    pub fn start(&self) -> Result<(), RuntimeError> {
        info!(
            bus = %self.config.bus.url,
            queue = %self.config.bus.queue_name,
            topic = %self.config.bus.topic_name,
            epoch = %self.generator.epoch(),
            "Starting feed runtime"
        );
        self.generator.start();
        self.adapter.start();

        for item in &self.config.items {
            self.adapter.subscribe(item, item.clone())?;
        }
        info!(items = self.config.items.len(), "Feed runtime running");
        Ok(())
    }

    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.adapter.shutdown();
        self.generator.shutdown();
        info!(
            snapshots = self.consumer.snapshots(),
            deltas = self.consumer.deltas(),
            routed = self.broker.messages_routed(),
            "Shutdown complete"
        );
    }

    #[must_use]
    pub fn status(&self) -> FeedStatus {
        self.adapter.status()
    }

    #[must_use]
    pub fn broker(&self) -> &Arc<InMemoryBroker> {
        &self.broker
    }

    #[must_use]
    pub fn adapter(&self) -> &Arc<FeedAdapter<LoggingConsumer>> {
        &self.adapter
    }

    #[must_use]
    pub fn generator(&self) -> &Arc<Generator> {
        &self.generator
    }

    #[must_use]
    pub fn consumer(&self) -> &Arc<LoggingConsumer> {
        &self.consumer
    }
}
