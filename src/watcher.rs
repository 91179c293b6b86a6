use crate::{
  once::{OnceCondition, OnceFuture},
  rc::MutRc,
  subscriber::{EventHandler, HandlerSubscription, Subscriber},
  subscription::Subscription,
};
use std::{cell::RefCell, rc::Rc};

/// A reactive single-value cell.
///
/// Holds a current value and notifies its listeners with `(new, previous)`
/// whenever `set_data` stores a value that differs (by `PartialEq`) from the
/// stored one. Clones share the same cell, so a watcher can be captured by
/// any number of listeners and derivations.
///
/// Notification is fully synchronous: `set_data` does not return until every
/// listener, including the listeners of downstream computed watchers, has
/// run. A panicking listener aborts the remaining pass and propagates to the
/// `set_data` caller.
///
/// ```
/// use watchcell::prelude::*;
///
/// let count = Watcher::new(0);
/// let doubled = count.computed(|v| v * 2);
/// count.set_data(4);
/// assert_eq!(doubled.data(), 8);
/// ```
pub struct Watcher<T> {
  subscriber: Subscriber<T>,
  data: MutRc<T>,
}

impl<T> Clone for Watcher<T> {
  fn clone(&self) -> Self {
    Self { subscriber: self.subscriber.clone(), data: self.data.clone() }
  }
}

impl<T> Watcher<T>
where
  T: Clone + PartialEq + 'static,
{
  pub fn new(initial: T) -> Self {
    Self { subscriber: Subscriber::new(), data: MutRc::own(initial) }
  }

  /// A clone of the current value.
  pub fn data(&self) -> T { self.data.rc_deref().clone() }

  /// Read the current value without cloning it.
  pub fn with_data<R>(&self, f: impl FnOnce(&T) -> R) -> R { f(&self.data.rc_deref()) }

  /// Store a new value and notify listeners, unless it equals the stored
  /// one, in which case nothing happens. Listeners reading `data()` during
  /// the pass see the new value.
  pub fn set_data(&self, value: T) {
    if *self.data.rc_deref() == value {
      return;
    }
    let last = std::mem::replace(&mut *self.data.rc_deref_mut(), value.clone());
    self.subscriber.notify(&value, &last);
  }

  /// Register a change listener; it first runs on the next effective
  /// `set_data`.
  pub fn observe(&self, f: impl FnMut(&T, &T) + 'static) -> HandlerSubscription<T> {
    self.subscriber.observe(f)
  }

  /// Like [`Watcher::observe`], but also invokes the listener synchronously
  /// at registration time with the current value. That initial call has no
  /// previous value, hence the `Option` in the listener's second argument;
  /// change notifications always carry `Some(previous)`.
  pub fn observe_immediate(
    &self, f: impl FnMut(&T, Option<&T>) + 'static,
  ) -> HandlerSubscription<T> {
    let f = Rc::new(RefCell::new(f));
    let shared = f.clone();
    let sub = self
      .subscriber
      .observe(move |new, prev| (shared.borrow_mut())(new, Some(prev)));
    let current = self.data();
    (f.borrow_mut())(&current, None);
    sub
  }

  pub fn unobserve(&self, handler: &EventHandler<T>) { self.subscriber.unobserve(handler); }

  pub fn unobserve_all(&self) { self.subscriber.unobserve_all(); }

  /// Resolve once, with the first new value matching the condition.
  ///
  /// The internal listener removes itself when the condition matches; until
  /// then it stays registered, whether or not the future is still held.
  pub fn once(&self, mut condition: OnceCondition<T>) -> OnceFuture<T> {
    let future = OnceFuture::new();
    let state = future.shared();
    let slot: Rc<RefCell<Option<HandlerSubscription<T>>>> = Rc::new(RefCell::new(None));

    let own_sub = slot.clone();
    let sub = self.observe(move |new, _| {
      if !condition.matches(new) {
        return;
      }
      if let Some(mut sub) = own_sub.borrow_mut().take() {
        sub.unsubscribe();
      }
      let waker = {
        let mut st = state.borrow_mut();
        st.value = Some(new.clone());
        st.done = true;
        st.waker.take()
      };
      if let Some(waker) = waker {
        waker.wake();
      }
    });
    *slot.borrow_mut() = Some(sub);
    future
  }

  /// Derive a new watcher that tracks `f` applied to this one.
  ///
  /// The derived watcher deduplicates through its own `set_data`, so source
  /// changes that map to an equal derived value notify nothing downstream.
  /// The source keeps the driving listener for its whole lifetime; there is
  /// no teardown for a discarded derived watcher.
  pub fn computed<U>(&self, f: impl Fn(&T) -> U + 'static) -> Watcher<U>
  where
    U: Clone + PartialEq + 'static,
  {
    let derived = Watcher::new(self.with_data(&f));
    let out = derived.clone();
    self.observe(move |new, _| out.set_data(f(new)));
    derived
  }

  /// Compose N source watchers into M derived ones.
  ///
  /// Every source gets the same recompute listener: any source change
  /// re-reads the *current* value of all N sources, applies `f`, and stores
  /// each slot of the result into the matching output watcher. Outputs
  /// deduplicate independently, so a change in one source may notify only
  /// some of them.
  pub fn combine<const N: usize, const M: usize, U>(
    sources: &[Watcher<T>; N], f: impl Fn(&[T; N]) -> [U; M] + 'static,
  ) -> [Watcher<U>; M]
  where
    U: Clone + PartialEq + 'static,
  {
    let current: [T; N] = std::array::from_fn(|i| sources[i].data());
    let outputs = f(&current).map(Watcher::new);

    let recompute: Rc<dyn Fn()> = {
      let sources = sources.clone();
      let outputs = outputs.clone();
      Rc::new(move || {
        let current: [T; N] = std::array::from_fn(|i| sources[i].data());
        for (watcher, value) in outputs.iter().zip(f(&current)) {
          watcher.set_data(value);
        }
      })
    };

    for source in sources {
      let recompute = recompute.clone();
      source.observe(move |_, _| recompute());
    }
    outputs
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use futures::task::noop_waker;
  use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
  };

  #[test]
  fn notifies_only_on_effective_change() {
    let watcher = Watcher::new(0);
    let calls = Rc::new(RefCell::new(vec![]));

    let c = calls.clone();
    watcher.observe(move |new, prev| c.borrow_mut().push((*new, *prev)));

    watcher.set_data(2);
    watcher.set_data(2);
    watcher.set_data(10);

    assert_eq!(*calls.borrow(), vec![(2, 0), (10, 2)]);
    assert_eq!(watcher.data(), 10);
  }

  #[test]
  fn listener_sees_stored_value_during_pass() {
    let watcher = Watcher::new(0);
    let seen = Rc::new(RefCell::new(vec![]));

    let w = watcher.clone();
    let c = seen.clone();
    watcher.observe(move |new, _| c.borrow_mut().push((*new, w.data())));

    watcher.set_data(3);
    assert_eq!(*seen.borrow(), vec![(3, 3)]);
  }

  #[test]
  fn observe_immediate_runs_once_with_no_previous() {
    let watcher = Watcher::new(5);
    let calls = Rc::new(RefCell::new(vec![]));

    let c = calls.clone();
    watcher.observe_immediate(move |new, prev| c.borrow_mut().push((*new, prev.copied())));

    watcher.set_data(6);
    assert_eq!(*calls.borrow(), vec![(5, None), (6, Some(5))]);
  }

  #[test]
  fn panicking_listener_propagates_to_set_data() {
    let watcher = Watcher::new(0);
    let reached = Rc::new(RefCell::new(false));

    watcher.observe(|_: &i32, _: &i32| panic!("render failed"));
    let c = reached.clone();
    watcher.observe(move |_: &i32, _: &i32| *c.borrow_mut() = true);

    let result =
      std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| watcher.set_data(7)));

    assert!(result.is_err());
    assert!(!*reached.borrow());
    // The value was stored before the pass started.
    assert_eq!(watcher.data(), 7);
  }

  #[test]
  fn unobserve_all_silences_the_watcher() {
    let watcher = Watcher::new(0);
    let hits = Rc::new(RefCell::new(0));

    let c = hits.clone();
    watcher.observe(move |_, _| *c.borrow_mut() += 1);
    watcher.unobserve_all();
    watcher.set_data(1);

    assert_eq!(*hits.borrow(), 0);
  }

  #[test]
  fn computed_tracks_and_deduplicates() {
    let source = Watcher::new(0);
    let doubled = source.computed(|v| v * 2);
    let calls = Rc::new(RefCell::new(vec![]));

    let c = calls.clone();
    doubled.observe(move |new, prev| c.borrow_mut().push((*new, *prev)));

    source.set_data(2);
    source.set_data(3);
    source.set_data(10);
    source.set_data(10);

    assert_eq!(*calls.borrow(), vec![(4, 0), (6, 4), (20, 6)]);
    assert_eq!(doubled.data(), 20);
  }

  #[test]
  fn computed_dedup_absorbs_mapped_collisions() {
    // Two distinct sources map to the same derived value; downstream sees
    // one notification.
    let source = Watcher::new(1);
    let parity = source.computed(|v| v % 2);
    let hits = Rc::new(RefCell::new(0));

    let c = hits.clone();
    parity.observe(move |_, _| *c.borrow_mut() += 1);

    source.set_data(3);
    source.set_data(5);
    assert_eq!(*hits.borrow(), 0);

    source.set_data(4);
    assert_eq!(*hits.borrow(), 1);
  }

  #[test]
  fn computed_chain_propagates_depth_first() {
    let source = Watcher::new(1);
    let doubled = source.computed(|v| v * 2);
    let quadrupled = doubled.computed(|v| v * 2);

    let order = Rc::new(RefCell::new(vec![]));
    let c = order.clone();
    quadrupled.observe(move |new, _| c.borrow_mut().push(("leaf", *new)));
    let c = order.clone();
    source.observe(move |new, _| c.borrow_mut().push(("root", *new)));

    source.set_data(3);
    // The computed listener on `source` was registered before the plain
    // one, so the whole downstream cascade finishes first.
    assert_eq!(*order.borrow(), vec![("leaf", 12), ("root", 3)]);
    assert_eq!(quadrupled.data(), 12);
  }

  #[test]
  fn once_next_resolves_on_any_change() {
    let watcher = Watcher::new(0);
    let mut future = watcher.once(OnceCondition::Next);

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    assert!(Pin::new(&mut future).poll(&mut cx).is_pending());

    watcher.set_data(1);
    assert_eq!(Pin::new(&mut future).poll(&mut cx), Poll::Ready(1));
  }

  #[test]
  fn once_equals_waits_for_the_exact_value() {
    let watcher = Watcher::new(0);
    let mut future = watcher.once(OnceCondition::Equals(568));

    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);

    watcher.set_data(10);
    watcher.set_data(444);
    assert!(Pin::new(&mut future).poll(&mut cx).is_pending());

    watcher.set_data(568);
    assert_eq!(Pin::new(&mut future).poll(&mut cx), Poll::Ready(568));
  }

  #[test]
  fn once_predicate_and_listener_cleanup() {
    let watcher = Watcher::new(0);
    let future = watcher.once(OnceCondition::when(|v| *v > 10));

    watcher.set_data(5);
    watcher.set_data(11);
    // Condition met: the internal listener removed itself.
    assert!(watcher.subscriber.is_empty());

    watcher.set_data(50);
    assert_eq!(futures::executor::block_on(future), 11);
  }

  #[test]
  fn abandoned_once_keeps_listening() {
    let watcher = Watcher::new(0);
    drop(watcher.once(OnceCondition::Equals(99)));
    assert_eq!(watcher.subscriber.len(), 1);

    watcher.set_data(99);
    assert!(watcher.subscriber.is_empty());
  }

  #[test]
  fn combine_recomputes_from_current_values() {
    let w1 = Watcher::new(1);
    let w2 = Watcher::new(2);
    let w3 = Watcher::new(3);

    let [sum_ab, sum_bc] =
      Watcher::combine(&[w1.clone(), w2.clone(), w3.clone()], |[a, b, c]| [a + b, b + c]);

    assert_eq!(sum_ab.data(), 3);
    assert_eq!(sum_bc.data(), 5);

    let bc_hits = Rc::new(RefCell::new(0));
    let c = bc_hits.clone();
    sum_bc.observe(move |_, _| *c.borrow_mut() += 1);

    w1.set_data(20);
    assert_eq!(sum_ab.data(), 22);
    assert_eq!(sum_bc.data(), 5);
    assert_eq!(*bc_hits.borrow(), 0);

    w3.set_data(30);
    assert_eq!(sum_ab.data(), 22);
    assert_eq!(sum_bc.data(), 32);
    assert_eq!(*bc_hits.borrow(), 1);
  }

  #[test]
  fn combine_single_source_fan_out() {
    let base = Watcher::new(2);
    let [double, square] = Watcher::combine(&[base.clone()], |[v]| [v * 2, v * v]);

    base.set_data(5);
    assert_eq!(double.data(), 10);
    assert_eq!(square.data(), 25);
  }

  #[test]
  fn watcher_clones_share_state() {
    let a = Watcher::new(String::from("x"));
    let b = a.clone();

    let calls = Rc::new(RefCell::new(vec![]));
    let c = calls.clone();
    b.observe(move |new, _| c.borrow_mut().push(new.clone()));

    a.set_data("y".into());
    assert_eq!(b.data(), "y");
    assert_eq!(*calls.borrow(), vec!["y".to_string()]);
  }
}
