//! Prelude module for convenient imports
//!
//! Re-exports the commonly used types and traits in one place.

pub use crate::channel::{ChannelData, Removal};
pub use crate::channel_subscriber::{
  ChannelHandler, ChannelSubscriber, ChannelSubscription, Unsubscribe,
};
pub use crate::once::{OnceCondition, OnceFuture};
pub use crate::rc::{MutRc, WeakRc};
pub use crate::subscriber::{EventHandler, HandlerSubscription, Subscriber};
pub use crate::subscription::{Subscription, SubscriptionGuard};
pub use crate::watcher::Watcher;
