//! The MOBIL lane-changing criterion.

use crate::input::LaneChangeInput;

/// A change of acceleration caused by a lane change, in m/s<sup>2</sup>.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AccChange {
    /// The acceleration if the subject vehicle stays in its lane.
    pub before: f64,
    /// The acceleration if the subject vehicle changes lanes.
    pub after: f64,
}

impl AccChange {
    pub fn new(before: f64, after: f64) -> Self {
        Self { before, after }
    }

    /// The acceleration gain of the lane change.
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

/// The lane change direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Decides whether a driver changes lanes.
///
/// A change is made when it is safe for the new follower and the driver's own
/// advantage, plus the politeness-weighted advantage of the affected followers and
/// the keep-right bias, exceeds a threshold.
#[derive(Clone, Debug)]
pub struct LaneChangeModel {
    params: LaneChangeInput,
}

impl LaneChangeModel {
    pub fn new(params: &LaneChangeInput) -> Self {
        Self { params: *params }
    }

    pub fn params(&self) -> &LaneChangeInput {
        &self.params
    }

    /// Checks the safety criterion.
    ///
    /// # Parameters
    /// * `gap_front` - The net gap to the new leader in m
    /// * `gap_back` - The net gap to the new follower in m
    /// * `new_follower_acc` - The new follower's acceleration after the change
    pub fn is_safe(&self, gap_front: f64, gap_back: f64, new_follower_acc: f64) -> bool {
        gap_front >= self.params.min_gap
            && gap_back >= self.params.min_gap
            && new_follower_acc >= -self.params.safe_deceleration
    }

    /// The incentive of a lane change in m/s<sup>2</sup>.
    pub fn incentive(
        &self,
        own: AccChange,
        new_follower: AccChange,
        old_follower: AccChange,
        direction: Direction,
    ) -> f64 {
        let bias = match direction {
            Direction::Right => self.params.bias_right,
            Direction::Left => -self.params.bias_right,
        };
        own.delta() + self.params.politeness * (new_follower.delta() + old_follower.delta()) + bias
    }

    /// Applies both the safety and the incentive criterion.
    pub fn should_change(
        &self,
        gap_front: f64,
        gap_back: f64,
        own: AccChange,
        new_follower: AccChange,
        old_follower: AccChange,
        direction: Direction,
    ) -> bool {
        self.is_safe(gap_front, gap_back, new_follower.after)
            && self.incentive(own, new_follower, old_follower, direction) > self.params.threshold_acc
    }
}
