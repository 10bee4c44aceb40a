//! # Bus Recovery Scenarios
//!
//! Broker outages as seen from both ends: every live session is told the
//! connection is gone, both sides keep retrying, and the feed comes back
//! with fresh snapshots once the broker does.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shared_types::ProducerEpoch;
    use sq_01_feed_adapter::FeedStatus;

    use crate::integration::fixtures::{eventually, Deployment, WATCHDOG};

    const ITEMS: [&str; 3] = ["item1", "item10", "item30"];

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_outage_yields_one_inactive_delta_per_item() {
        let d = Deployment::new(&ITEMS);
        let generator = d.start_generator(77);
        assert!(
            eventually(|| ITEMS
                .iter()
                .all(|item| d.consumer.count(0, item, |e| e.is_live_snapshot()) == 1))
            .await
        );

        let mark = d.consumer.mark();
        d.broker.set_available(false);

        assert!(eventually(|| d.adapter.status() == FeedStatus::Down).await);
        assert!(eventually(|| generator.subscription_count() == 0).await);
        // Longer than a watchdog interval: nothing else may turn up.
        tokio::time::sleep(WATCHDOG + Duration::from_millis(200)).await;

        for item in ITEMS {
            let events = d.consumer.for_item(mark, item);
            let inactive: Vec<_> = events.iter().filter(|e| e.is_inactive()).collect();
            assert_eq!(inactive.len(), 1, "{item}");
            assert!(!inactive[0].is_snapshot);
            assert_eq!(events.last().map(|e| e.is_inactive()), Some(true));
        }

        generator.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_feed_recovers_when_broker_returns() {
        let d = Deployment::new(&ITEMS);
        let generator = d.start_generator(77);
        assert!(eventually(|| d.adapter.status() == FeedStatus::Up).await);

        d.broker.set_available(false);
        assert!(eventually(|| d.adapter.status() == FeedStatus::Down).await);
        // A few failed attempts on both sides.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mark = d.consumer.mark();

        d.broker.set_available(true);

        assert!(eventually(|| d.adapter.status() == FeedStatus::Up).await);
        // Same producer run, but the generator forgot every subscription.
        assert_eq!(d.adapter.producer_epoch(), Some(ProducerEpoch(77)));
        assert!(eventually(|| generator.subscription_count() == 3).await);
        assert!(
            eventually(|| ITEMS
                .iter()
                .all(|item| d.consumer.count(mark, item, |e| !e.is_snapshot) >= 1
                    && d.consumer.count(mark, item, |e| e.is_live_snapshot()) == 1))
            .await
        );
        assert!(d.adapter.pending_requests().is_empty());

        generator.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_flapping_broker_settles_on_one_session() {
        let d = Deployment::new(&ITEMS);
        let generator = d.start_generator(77);
        assert!(eventually(|| d.adapter.status() == FeedStatus::Up).await);

        for _ in 0..5 {
            d.broker.set_available(false);
            tokio::time::sleep(Duration::from_millis(15)).await;
            d.broker.set_available(true);
            tokio::time::sleep(Duration::from_millis(15)).await;
        }

        assert!(eventually(|| d.adapter.status() == FeedStatus::Up).await);
        assert!(eventually(|| generator.subscription_count() == 3).await);

        assert!(
            eventually(|| ITEMS
                .iter()
                .all(|item| d.consumer.count(0, item, |e| e.is_live_snapshot()) >= 2))
            .await
        );

        // Settled: only deltas from here on.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mark = d.consumer.mark();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let events = d.consumer.since(mark);

        assert!(!events.is_empty());
        assert!(events.iter().all(|e| !e.is_snapshot && !e.is_inactive()));
        assert_eq!(d.adapter.producer_epoch(), Some(ProducerEpoch(77)));
        assert!(d.adapter.pending_requests().is_empty());

        generator.shutdown();
    }
}
