//! # Delivery Scenarios
//!
//! Snapshot-once delivery and unsubscription across adapter, bus and
//! generator.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sq_01_feed_adapter::{DataProvider, FeedStatus};

    use crate::integration::fixtures::{eventually, Deployment};

    const ITEMS: [&str; 3] = ["item1", "item2", "item3"];

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_inactive_then_live_snapshot_then_deltas() {
        let d = Deployment::new(&ITEMS);
        let generator = d.start_generator(77);

        assert!(
            eventually(|| ITEMS
                .iter()
                .all(|item| d.consumer.count(0, item, |e| !e.is_snapshot) >= 2))
            .await
        );
        assert_eq!(d.adapter.status(), FeedStatus::Up);

        for item in ITEMS {
            let events = d.consumer.for_item(0, item);
            assert!(events[0].is_snapshot && events[0].is_inactive(), "{item}");
            assert!(events[1].is_live_snapshot(), "{item}");
            assert_eq!(events[1].fields["item_status"], "active");
            assert!(events[2..].iter().all(|e| !e.is_snapshot), "{item}");
        }

        generator.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unsubscribe_reaches_generator() {
        let d = Deployment::new(&ITEMS);
        let generator = d.start_generator(77);
        assert!(eventually(|| generator.subscription_count() == 3).await);

        d.adapter.unsubscribe("item2").unwrap();

        assert!(eventually(|| generator.subscription_count() == 2).await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mark = d.consumer.mark();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(d.consumer.for_item(mark, "item2").len(), 0);
        assert!(!d.consumer.for_item(mark, "item1").is_empty());

        generator.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_subscribe_while_live_gets_single_snapshot() {
        let d = Deployment::new(&["item1"]);
        let generator = d.start_generator(77);
        assert!(eventually(|| d.adapter.status() == FeedStatus::Up).await);

        let mark = d.consumer.mark();
        d.adapter.subscribe("item9", "item9".to_string()).unwrap();

        assert!(eventually(|| d.consumer.count(mark, "item9", |e| !e.is_snapshot) >= 2).await);
        let events = d.consumer.for_item(mark, "item9");
        assert!(events[0].is_live_snapshot());
        assert_eq!(events.iter().filter(|e| e.is_snapshot).count(), 1);

        generator.shutdown();
    }
}
