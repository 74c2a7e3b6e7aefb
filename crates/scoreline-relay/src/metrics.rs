//! Metric names recorded by the relay core.

/// Events handed to the dispatcher (counter).
pub const RELAY_PUBLISH_TOTAL: &str = "relay_publish_total";
/// Frames enqueued to members (counter).
pub const RELAY_DELIVERIES_TOTAL: &str = "relay_deliveries_total";
/// Member sends that failed (counter).
pub const RELAY_DELIVERY_FAILURES_TOTAL: &str = "relay_delivery_failures_total";
/// Channels with at least one member (gauge).
pub const RELAY_CHANNELS_ACTIVE: &str = "relay_channels_active";
