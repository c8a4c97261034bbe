use chrono::{DateTime, Utc};

use crmsync_core::TenantId;

/// A domain event: something that already happened to an aggregate.
///
/// Recorded in the aggregate's buffer and dispatched once the aggregate has
/// been saved. `event_type` plus `version` identify the payload schema, so
/// handlers such as the CRM mirror can evolve independently.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted `<context>.<aggregate>.<fact>` name, e.g. `"customers.customer.created"`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the change, not dispatch time.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Tenant of the aggregate that raised the event. Must match the envelope.
    fn tenant_id(&self) -> TenantId;
}
