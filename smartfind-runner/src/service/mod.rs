//! Service layer
//!
//! Services hold the agent's page-level behavior: logging in, resolving
//! blocked dates, claiming a listing, and telling the user about it. They
//! run against the [`Surface`](crate::browser::Surface),
//! [`Clock`] and [`Notifier`] seams so the poller can be tested without a
//! browser or a network.

mod claim;
mod clock;
mod notifier;
mod schedule;
mod session;

// Re-export traits
pub use clock::Clock;
pub use notifier::Notifier;

// Re-export implementations
pub use claim::{ClaimOutcome, ClaimProtocol};
pub use clock::SystemClock;
pub use notifier::{Alert, DEFAULT_TITLE, PushoverNotifier};
pub use schedule::BlackoutResolver;
pub use session::PortalSession;
