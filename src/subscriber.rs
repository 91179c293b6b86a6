use crate::{
  rc::{MutRc, WeakRc},
  subscription::Subscription,
};
use smallvec::SmallVec;
use std::{cell::RefCell, rc::Rc};

type HandlerList<T> = SmallVec<[EventHandler<T>; 2]>;

/// A listener for one value stream, invoked with `(new, previous)`.
///
/// Handlers compare by identity: two handlers are equal only when they are
/// clones of the same registration. Wrapping the same closure twice yields
/// two distinct handlers, each removable on its own.
pub struct EventHandler<T>(Rc<RefCell<dyn FnMut(&T, &T)>>);

impl<T> EventHandler<T> {
  pub fn new(f: impl FnMut(&T, &T) + 'static) -> Self
  where
    T: 'static,
  {
    Self(Rc::new(RefCell::new(f)))
  }

  /// Panics if the handler is re-entered, i.e. a notification pass reaches
  /// this handler while one of its earlier invocations is still on the
  /// stack.
  pub(crate) fn call(&self, new: &T, prev: &T) { (self.0.borrow_mut())(new, prev) }
}

impl<T> Clone for EventHandler<T> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> PartialEq for EventHandler<T> {
  fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

/// Ordered multicast registry for a single logical value stream.
///
/// Listeners run in registration order. `notify` snapshots the list before
/// dispatch, so listeners registered or removed during a pass only affect
/// later passes; every snapshotted listener runs at most once per pass.
pub struct Subscriber<T> {
  events: MutRc<HandlerList<T>>,
}

impl<T> Default for Subscriber<T> {
  fn default() -> Self { Self { events: MutRc::own(SmallVec::new()) } }
}

impl<T> Clone for Subscriber<T> {
  fn clone(&self) -> Self { Self { events: self.events.clone() } }
}

impl<T: 'static> Subscriber<T> {
  pub fn new() -> Self { Self::default() }

  /// Register a listener and return the handle that removes it again.
  pub fn observe(&self, f: impl FnMut(&T, &T) + 'static) -> HandlerSubscription<T> {
    self.observe_handler(EventHandler::new(f))
  }

  /// Register a pre-built handler. Keep a clone of the handler around to
  /// remove it later through [`Subscriber::unobserve`].
  pub fn observe_handler(&self, handler: EventHandler<T>) -> HandlerSubscription<T> {
    self.events.rc_deref_mut().push(handler.clone());
    HandlerSubscription { events: self.events.downgrade(), handler, closed: false }
  }

  /// Remove every occurrence of the handler.
  pub fn unobserve(&self, handler: &EventHandler<T>) {
    self.events.rc_deref_mut().retain(|h| *h != *handler);
  }

  /// Remove all listeners.
  pub fn unobserve_all(&self) { self.events.rc_deref_mut().clear(); }

  pub fn len(&self) -> usize { self.events.rc_deref().len() }

  pub fn is_empty(&self) -> bool { self.events.rc_deref().is_empty() }

  /// Invoke every currently registered listener with `(new, prev)`, in
  /// registration order. A panicking listener aborts the rest of the pass
  /// and propagates to the caller.
  pub fn notify(&self, new: &T, prev: &T) {
    let snapshot: HandlerList<T> = self.events.rc_deref().clone();
    for handler in &snapshot {
      handler.call(new, prev);
    }
  }
}

/// Deregistration handle for one [`Subscriber`] listener.
pub struct HandlerSubscription<T> {
  events: WeakRc<HandlerList<T>>,
  handler: EventHandler<T>,
  closed: bool,
}

impl<T> HandlerSubscription<T> {
  /// The registered handler, e.g. to remove it via
  /// [`Subscriber::unobserve`] instead of this handle.
  pub fn handler(&self) -> EventHandler<T> { self.handler.clone() }
}

impl<T> Subscription for HandlerSubscription<T> {
  fn unsubscribe(&mut self) {
    if self.closed {
      return;
    }
    self.closed = true;
    if let Some(events) = self.events.upgrade() {
      events.rc_deref_mut().retain(|h| *h != self.handler);
    }
  }

  fn is_closed(&self) -> bool { self.closed }
}
