use std::{
  cell::RefCell,
  future::Future,
  pin::Pin,
  rc::Rc,
  task::{Context, Poll, Waker},
};

/// What a one-shot wait on a watcher is waiting for.
pub enum OnceCondition<T> {
  /// The very next change, whatever the value.
  Next,
  /// The first change whose new value equals this one.
  Equals(T),
  /// The first change for which the predicate returns true.
  Where(Box<dyn FnMut(&T) -> bool>),
}

impl<T: PartialEq> OnceCondition<T> {
  /// Shorthand for [`OnceCondition::Where`] without spelling out the box.
  pub fn when(predicate: impl FnMut(&T) -> bool + 'static) -> Self {
    Self::Where(Box::new(predicate))
  }

  pub(crate) fn matches(&mut self, value: &T) -> bool {
    match self {
      Self::Next => true,
      Self::Equals(expected) => value == expected,
      Self::Where(predicate) => predicate(value),
    }
  }
}

pub(crate) struct OnceState<T> {
  pub(crate) value: Option<T>,
  pub(crate) waker: Option<Waker>,
  pub(crate) done: bool,
}

/// Future returned by `Watcher::once`: resolves with the first new value
/// matching the condition, from inside the notification pass that carried
/// it.
///
/// There is no timeout and no cancellation handle: if the condition never
/// matches the future stays pending, and dropping it leaves the internal
/// listener registered until the condition is satisfied.
pub struct OnceFuture<T> {
  state: Rc<RefCell<OnceState<T>>>,
}

impl<T> OnceFuture<T> {
  pub(crate) fn new() -> Self {
    Self { state: Rc::new(RefCell::new(OnceState { value: None, waker: None, done: false })) }
  }

  pub(crate) fn shared(&self) -> Rc<RefCell<OnceState<T>>> { self.state.clone() }
}

impl<T> Future for OnceFuture<T> {
  type Output = T;

  /// Panics when polled again after returning `Poll::Ready`.
  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut state = self.state.borrow_mut();
    if state.done {
      match state.value.take() {
        Some(value) => Poll::Ready(value),
        None => panic!("OnceFuture polled after completion"),
      }
    } else {
      state.waker = Some(cx.waker().clone());
      Poll::Pending
    }
  }
}
