use crate::{
  channel::{ChannelData, Removal},
  rc::{MutRc, WeakRc},
  subscription::Subscription,
};
use smallvec::SmallVec;
use std::{cell::RefCell, hash::Hash, rc::Rc};

/// A callback registered under a channel name, invoked with the notification
/// payload. Identity semantics match [`EventHandler`]: clones of one
/// registration compare equal, separate registrations never do.
///
/// [`EventHandler`]: crate::subscriber::EventHandler
pub struct ChannelHandler<P>(Rc<RefCell<dyn FnMut(&P)>>);

impl<P> ChannelHandler<P> {
  pub fn new(f: impl FnMut(&P) + 'static) -> Self
  where
    P: 'static,
  {
    Self(Rc::new(RefCell::new(f)))
  }

  pub(crate) fn call(&self, payload: &P) { (self.0.borrow_mut())(payload) }
}

impl<P> Clone for ChannelHandler<P> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<P> PartialEq for ChannelHandler<P> {
  fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

/// Selects which listeners [`ChannelSubscriber::unobserve`] drops.
pub enum Unsubscribe<K, P> {
  /// Everything, across all channels.
  All,
  /// This handler, wherever it appears.
  Handler(ChannelHandler<P>),
  /// A whole channel with all its handlers.
  Channel(K),
  /// This handler within one channel only.
  HandlerIn(K, ChannelHandler<P>),
}

/// Multiplexes independently named event streams over one [`ChannelData`] of
/// callbacks: observers register under a channel name, `notify` dispatches a
/// payload to that channel's handlers in insertion order.
pub struct ChannelSubscriber<K, P> {
  data: MutRc<ChannelData<K, ChannelHandler<P>>>,
}

impl<K, P> Default for ChannelSubscriber<K, P> {
  fn default() -> Self { Self { data: MutRc::own(ChannelData::default()) } }
}

impl<K, P> Clone for ChannelSubscriber<K, P> {
  fn clone(&self) -> Self { Self { data: self.data.clone() } }
}

impl<K, P> ChannelSubscriber<K, P>
where
  K: Eq + Hash + Clone + 'static,
  P: 'static,
{
  pub fn new() -> Self { Self::default() }

  /// Register a callback under the channel name and return the handle that
  /// removes it again.
  pub fn observe(&self, channel: K, f: impl FnMut(&P) + 'static) -> ChannelSubscription<K, P> {
    self.observe_handler(channel, ChannelHandler::new(f))
  }

  pub fn observe_handler(
    &self, channel: K, handler: ChannelHandler<P>,
  ) -> ChannelSubscription<K, P> {
    self.data.rc_deref_mut().push(channel.clone(), handler.clone());
    ChannelSubscription { data: self.data.downgrade(), channel, handler, closed: false }
  }

  pub fn unobserve(&self, target: Unsubscribe<K, P>) {
    let mut data = self.data.rc_deref_mut();
    match target {
      Unsubscribe::All => data.clear(),
      Unsubscribe::Handler(handler) => data.remove(Removal::Value(handler)),
      Unsubscribe::Channel(channel) => data.remove(Removal::Channel(channel)),
      Unsubscribe::HandlerIn(channel, handler) => {
        data.remove(Removal::ValueIn(channel, handler))
      }
    }
  }

  /// Invoke every callback currently registered under the channel, in
  /// insertion order. Handlers registered or removed by a callback only
  /// affect later notifications.
  pub fn notify(&self, channel: &K, payload: &P) {
    let snapshot: SmallVec<[ChannelHandler<P>; 2]> = {
      let data = self.data.rc_deref();
      let mut handlers = SmallVec::new();
      data.for_each_in_channel(channel, |handler, _| handlers.push(handler.clone()));
      handlers
    };
    for handler in &snapshot {
      handler.call(payload);
    }
  }

  pub fn listener_count(&self, channel: &K) -> usize { self.data.rc_deref().channel_len(channel) }
}

/// Deregistration handle for one channel listener.
pub struct ChannelSubscription<K, P> {
  data: WeakRc<ChannelData<K, ChannelHandler<P>>>,
  channel: K,
  handler: ChannelHandler<P>,
  closed: bool,
}

impl<K, P> ChannelSubscription<K, P> {
  pub fn handler(&self) -> ChannelHandler<P> { self.handler.clone() }
}

impl<K, P> Subscription for ChannelSubscription<K, P>
where
  K: Eq + Hash + Clone,
{
  fn unsubscribe(&mut self) {
    if self.closed {
      return;
    }
    self.closed = true;
    if let Some(data) = self.data.upgrade() {
      data
        .rc_deref_mut()
        .remove(Removal::ValueIn(self.channel.clone(), self.handler.clone()));
    }
  }

  fn is_closed(&self) -> bool { self.closed }
}
