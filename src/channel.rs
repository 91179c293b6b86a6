use smallvec::SmallVec;
use std::{collections::HashMap, hash::Hash};

type Stack<T> = SmallVec<[T; 2]>;

/// Selects what [`ChannelData::remove`] takes out of the container. One
/// variant per removal shape, so resolution happens in the type system
/// instead of by runtime inspection of the argument.
pub enum Removal<K, T> {
  /// Drop a whole channel and everything stacked in it.
  Channel(K),
  /// Remove every occurrence of the value, searching all channels.
  Value(T),
  /// Remove occurrences of the value within one channel only.
  ValueIn(K, T),
  /// Channel-or-value resolution: an *existing* channel with this key wins;
  /// otherwise the value is removed from every channel. The channel
  /// existence check always runs first.
  ChannelOrValue(K, T),
}

/// Keyed multi-stack container: each channel key owns a LIFO stack of values.
///
/// A key is present iff its stack is non-empty; any operation that empties a
/// stack also drops the key, so iteration never sees hollow channels.
pub struct ChannelData<K, T> {
  data: HashMap<K, Stack<T>>,
}

impl<K, T> Default for ChannelData<K, T> {
  fn default() -> Self { Self { data: HashMap::new() } }
}

impl<K, T> ChannelData<K, T>
where
  K: Eq + Hash,
{
  pub fn new() -> Self { Self::default() }

  /// Append a value to the channel's stack, creating the channel on first
  /// push.
  pub fn push(&mut self, channel: K, value: T) {
    self.data.entry(channel).or_default().push(value);
  }

  /// Remove and return the most recently pushed value of the channel.
  /// `None` when the channel is absent.
  pub fn pop(&mut self, channel: &K) -> Option<T> {
    let stack = self.data.get_mut(channel)?;
    let value = stack.pop();
    if stack.is_empty() {
      self.data.remove(channel);
    }
    value
  }

  pub fn clear(&mut self) { self.data.clear(); }

  #[inline]
  pub fn is_empty(&self) -> bool { self.data.is_empty() }

  #[inline]
  pub fn contains_channel(&self, channel: &K) -> bool { self.data.contains_key(channel) }

  /// Number of values stacked in the channel; 0 when absent.
  pub fn channel_len(&self, channel: &K) -> usize {
    self.data.get(channel).map_or(0, |s| s.len())
  }

  /// Visit every `(value, channel, index)` triple. Order across channels is
  /// unspecified; order within a channel is push order.
  pub fn for_each(&self, mut cb: impl FnMut(&T, &K, usize)) {
    for (key, stack) in &self.data {
      for (i, value) in stack.iter().enumerate() {
        cb(value, key, i);
      }
    }
  }

  /// Visit `(value, index)` for one channel, in push order. No-op when the
  /// channel is absent.
  pub fn for_each_in_channel(&self, channel: &K, mut cb: impl FnMut(&T, usize)) {
    if let Some(stack) = self.data.get(channel) {
      for (i, value) in stack.iter().enumerate() {
        cb(value, i);
      }
    }
  }
}

impl<K, T> ChannelData<K, T>
where
  K: Eq + Hash,
  T: PartialEq,
{
  pub fn remove(&mut self, removal: Removal<K, T>) {
    match removal {
      Removal::Channel(key) => {
        self.data.remove(&key);
      }
      Removal::Value(value) => self.remove_value(&value),
      Removal::ValueIn(key, value) => self.remove_value_in(&key, &value),
      Removal::ChannelOrValue(key, value) => {
        // Existing channel key takes precedence over value lookup.
        if self.data.remove(&key).is_none() {
          self.remove_value(&value);
        }
      }
    }
  }

  fn remove_value(&mut self, value: &T) {
    self.data.retain(|_, stack| {
      stack.retain(|item| *item != *value);
      !stack.is_empty()
    });
  }

  fn remove_value_in(&mut self, key: &K, value: &T) {
    if let Some(stack) = self.data.get_mut(key) {
      stack.retain(|item| *item != *value);
      if stack.is_empty() {
        self.data.remove(key);
      }
    }
  }
}
