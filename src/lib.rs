//! # watchcell: synchronous reactive watcher cells
//!
//! A small reactive core: value cells that notify listeners on change,
//! derived cells recomputed from their sources, one-shot awaited conditions,
//! and channel-keyed multicast for named event streams.
//!
//! ## Quick Start
//!
//! ```rust
//! use watchcell::prelude::*;
//!
//! let count = Watcher::new(0);
//! let label = count.computed(|v| format!("count = {v}"));
//!
//! count.set_data(3);
//! assert_eq!(label.data(), "count = 3");
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Watcher`] | Reactive cell emitting `(new, previous)` on change |
//! | [`Subscriber`] | Ordered multicast listener registry for one stream |
//! | [`ChannelSubscriber`] | Named event streams over one [`ChannelData`] |
//! | [`ChannelData`] | Keyed multi-stack container |
//! | [`Subscription`] | Handle to deregister a listener |
//!
//! Everything runs on the caller's stack: `set_data` returns only after the
//! whole synchronous notification cascade, computed chains included, has
//! finished. The single asynchronous construct is the future returned by
//! [`Watcher::once`], resolved from within a later notification pass.
//!
//! [`Watcher`]: watcher::Watcher
//! [`Watcher::once`]: watcher::Watcher::once
//! [`Subscriber`]: subscriber::Subscriber
//! [`ChannelSubscriber`]: channel_subscriber::ChannelSubscriber
//! [`ChannelData`]: channel::ChannelData
//! [`Subscription`]: subscription::Subscription

pub mod channel;
pub mod channel_subscriber;
pub mod once;
pub mod prelude;
pub mod rc;
pub mod subscriber;
pub mod subscription;
pub mod watcher;

pub use prelude::*;
