use crate::constants::constants;
use crate::model::SubscriberRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
  Min,
  Max,
}

/// Two-handle integer slider over the subscriber-count domain.
/// Handles never cross and never leave `[floor, ceiling]`.
#[derive(Debug, Clone)]
pub struct RangeSlider {
  floor: u64,
  ceiling: u64,
  min: u64,
  max: u64,
  pub fine_step: u64,
  pub coarse_step: u64,
}

impl RangeSlider {
  pub fn new(floor: u64, ceiling: u64, initial: SubscriberRange) -> Self {
    let c = constants();
    let mut slider = Self {
      floor,
      ceiling,
      min: floor,
      max: ceiling,
      fine_step: c.slider_fine_step,
      coarse_step: c.slider_coarse_step,
    };
    slider.set(initial);
    slider
  }

  /// Slider over the built-in subscriber domain.
  pub fn subscribers(initial: SubscriberRange) -> Self {
    let c = constants();
    Self::new(c.subscriber_floor, c.subscriber_ceiling, initial)
  }

  pub fn set(&mut self, range: SubscriberRange) {
    self.max = range.max.clamp(self.floor, self.ceiling);
    self.min = range.min.clamp(self.floor, self.max);
  }

  pub fn range(&self) -> SubscriberRange {
    SubscriberRange::new(self.min, self.max)
  }

  pub fn bounds(&self) -> (u64, u64) {
    (self.floor, self.ceiling)
  }

  /// Move one handle by `delta`, stopping at the other handle or the domain edge.
  pub fn nudge(&mut self, handle: Handle, delta: i64) {
    let step = delta.unsigned_abs();
    match (handle, delta < 0) {
      (Handle::Min, true) => self.min = self.min.saturating_sub(step).max(self.floor),
      (Handle::Min, false) => self.min = self.min.saturating_add(step).min(self.max),
      (Handle::Max, true) => self.max = self.max.saturating_sub(step).max(self.min),
      (Handle::Max, false) => self.max = self.max.saturating_add(step).min(self.ceiling),
    }
  }

  /// Jump a handle to its extreme.
  pub fn jump(&mut self, handle: Handle, to_end: bool) {
    match (handle, to_end) {
      (Handle::Min, false) => self.min = self.floor,
      (Handle::Min, true) => self.min = self.max,
      (Handle::Max, false) => self.max = self.min,
      (Handle::Max, true) => self.max = self.ceiling,
    }
  }

  /// Cell column (0-based, `< width`) of `value` on a track `width` cells wide.
  pub fn column(&self, value: u64, width: usize) -> usize {
    if width == 0 || self.ceiling <= self.floor {
      return 0;
    }
    let span = (self.ceiling - self.floor) as f64;
    let ratio = (value.saturating_sub(self.floor)) as f64 / span;
    ((ratio * (width - 1) as f64).round() as usize).min(width - 1)
  }
}
