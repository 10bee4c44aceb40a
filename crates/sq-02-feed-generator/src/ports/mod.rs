//! Ports of the generator.

use shared_types::{FieldMap, ItemName};

/// Receives the events of a quote source.
///
/// `is_snapshot` marks a complete field map sent on request; periodic
/// trades are reported with `false` even though their maps are complete too.
pub trait FeedListener: Send + Sync {
    fn on_event(&self, item: &ItemName, fields: &FieldMap, is_snapshot: bool);
}
