// Bookmark Base managers
// Managers own domain state and intents: the canonical library, the
// capture queue, the bridge relay and the pending-change reconciler.

pub mod bridge_relay;
pub mod capture_queue;
pub mod library;
pub mod reconciler;
