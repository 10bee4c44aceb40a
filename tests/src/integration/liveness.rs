//! # Producer Liveness Scenarios
//!
//! A producer run is identified by the epoch its heartbeats carry. A new
//! epoch means a restarted generator that knows nothing about our
//! subscriptions; a silent one means the feed is down even though the bus
//! is fine.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shared_types::ProducerEpoch;
    use sq_01_feed_adapter::FeedStatus;

    use crate::integration::fixtures::{eventually, Deployment, WATCHDOG};

    const ITEMS: [&str; 2] = ["item4", "item5"];

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_producer_restart_resubscribes_everything() {
        let d = Deployment::new(&ITEMS);
        let first = d.start_generator(77);
        assert!(eventually(|| first.subscription_count() == 2).await);
        assert_eq!(d.adapter.producer_epoch(), Some(ProducerEpoch(77)));

        first.shutdown();
        let mark = d.consumer.mark();
        let second = d.start_generator(42);

        assert!(eventually(|| d.adapter.producer_epoch() == Some(ProducerEpoch(42))).await);
        assert!(eventually(|| second.subscription_count() == 2).await);
        assert!(
            eventually(|| ITEMS
                .iter()
                .all(|item| d.consumer.count(mark, item, |e| e.is_live_snapshot()) == 1))
            .await
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        for item in ITEMS {
            let events = d.consumer.for_item(mark, item);
            // The new run replaces the old one within a watchdog interval:
            // straight from old deltas to a fresh snapshot.
            let first_snapshot = events.iter().position(|e| e.is_snapshot).unwrap();
            assert!(events[first_snapshot].is_live_snapshot(), "{item}");
            assert_eq!(events.iter().filter(|e| e.is_snapshot).count(), 1, "{item}");
            assert!(events.iter().all(|e| !e.is_inactive()), "{item}");
        }
        assert_eq!(d.adapter.status(), FeedStatus::Up);

        second.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_silent_producer_turns_items_inactive() {
        let d = Deployment::new(&ITEMS);
        let generator = d.start_generator(77);
        assert!(eventually(|| d.adapter.status() == FeedStatus::Up).await);
        assert!(
            eventually(|| ITEMS
                .iter()
                .all(|item| d.consumer.count(0, item, |e| e.is_live_snapshot()) == 1))
            .await
        );

        generator.shutdown();
        let mark = d.consumer.mark();

        assert!(eventually(|| d.adapter.status() == FeedStatus::Idle).await);
        tokio::time::sleep(WATCHDOG * 2).await;

        for item in ITEMS {
            let inactive = d.consumer.count(mark, item, |e| e.is_inactive());
            assert_eq!(inactive, 1, "{item}");
            let events = d.consumer.for_item(mark, item);
            let last = events.last().unwrap();
            assert!(last.is_inactive() && !last.is_snapshot);
            assert_eq!(last.fields.len(), 1);
        }
        assert_eq!(d.adapter.producer_epoch(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_feed_returns_after_stall() {
        let d = Deployment::new(&ITEMS);
        let first = d.start_generator(77);
        assert!(eventually(|| d.adapter.status() == FeedStatus::Up).await);
        first.shutdown();
        assert!(eventually(|| d.adapter.status() == FeedStatus::Idle).await);

        let mark = d.consumer.mark();
        let second = d.start_generator(78);

        assert!(
            eventually(|| ITEMS
                .iter()
                .all(|item| d.consumer.count(mark, item, |e| e.is_live_snapshot()) == 1))
            .await
        );
        assert_eq!(d.adapter.producer_epoch(), Some(ProducerEpoch(78)));
        tokio::time::sleep(Duration::from_millis(100)).await;
        for item in ITEMS {
            assert_eq!(d.consumer.count(mark, item, |e| e.is_snapshot), 1, "{item}");
        }

        second.shutdown();
    }
}
