//! Getting samples from the buffer to every connected viewer.
//!
//! Push: the producer's append is fanned out to one bounded queue per
//! session. Pull: each session polls the buffer on its own timer. Both paths
//! end in the same `ViewerSession` cursor check.

pub mod hub;
pub mod queue;
pub mod subscription;

pub use hub::{DeliveryChannel, DeliverySettings, DeliveryStrategy};
pub use queue::{Delivery, OverflowPolicy, SessionQueue};
pub use subscription::Subscription;
