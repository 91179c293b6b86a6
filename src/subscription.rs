/// Handle returned from `observe` that deregisters a listener.
///
/// Unsubscribing is the only cancellation mechanism in this crate and is
/// always idempotent: the second and later calls are no-ops.
pub trait Subscription {
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

/// An RAII wrapper of a subscription: when the guard is dropped the
/// subscription is unsubscribed.
///
/// Subscriptions themselves deliberately do *not* unsubscribe on drop, so
/// that an internal listener (e.g. the one driving a computed watcher) can
/// outlive its handle. Wrap a handle in a guard when scoped teardown is
/// wanted, typically by a UI-binding layer that owns the listener lifecycle.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<S: Subscription>(pub(crate) S);

impl<S: Subscription> SubscriptionGuard<S> {
  pub fn new(subscription: S) -> Self { Self(subscription) }
}

impl<S: Subscription> Subscription for SubscriptionGuard<S> {
  #[inline]
  fn unsubscribe(&mut self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<S: Subscription> Drop for SubscriptionGuard<S> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

impl<S: Subscription + ?Sized> Subscription for Box<S> {
  #[inline]
  fn unsubscribe(&mut self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}
