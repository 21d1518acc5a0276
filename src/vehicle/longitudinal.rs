//! Car-following ("longitudinal") models.
//!
//! The supported model families form the closed set [ModelKind]; a built model is a
//! [LongitudinalModel], one variant per family. Every dispatch over the families is an
//! exhaustive `match`, so adding a family is a compile error until each site handles it.

pub use acc::Acc;
pub use gipps::Gipps;
pub use idm::Idm;
pub use kkw::Kkw;
pub use krauss::Krauss;
pub use nsm::Nsm;
pub use ovm_fvdm::OvmFvdm;

use crate::error::ParseModelKindError;
use crate::input::LongitudinalModelInput;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

mod acc;
mod gipps;
mod idm;
mod kkw;
mod krauss;
mod nsm;
mod ovm_fvdm;

/// The maximum deceleration of all vehicles in m/s<sup>2</sup>.
pub(crate) const MAX_DECEL: f64 = -9.0;

/// A car-following model family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelKind {
    Idm,
    Acc,
    Gipps,
    Krauss,
    Nsm,
    Kkw,
    OvmFvdm,
}

impl ModelKind {
    /// Every supported family.
    pub const ALL: [ModelKind; 7] = [
        ModelKind::Idm,
        ModelKind::Acc,
        ModelKind::Gipps,
        ModelKind::Krauss,
        ModelKind::Nsm,
        ModelKind::Kkw,
        ModelKind::OvmFvdm,
    ];

    /// The identifier used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Idm => "IDM",
            ModelKind::Acc => "ACC",
            ModelKind::Gipps => "GIPPS",
            ModelKind::Krauss => "KRAUSS",
            ModelKind::Nsm => "NSM",
            ModelKind::Kkw => "KKW",
            ModelKind::OvmFvdm => "OVM_FVDM",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ParseModelKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseModelKindError(s.to_owned()))
    }
}

/// The traffic situation seen by a driver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTraffic {
    /// The vehicle's own speed in m/s.
    pub vel: f64,
    /// The net distance to the leader in m; infinite on a free road.
    pub gap: f64,
    /// The leader's speed in m/s.
    pub lead_vel: f64,
    /// The leader's acceleration in m/s<sup>2</sup>.
    pub lead_acc: f64,
    /// The local speed limit in m/s.
    pub speed_limit: f64,
}

impl LocalTraffic {
    /// A vehicle alone on an unrestricted road.
    pub fn free(vel: f64) -> Self {
        Self {
            vel,
            gap: f64::INFINITY,
            lead_vel: vel,
            lead_acc: 0.0,
            speed_limit: f64::INFINITY,
        }
    }

    /// A vehicle following a leader which drives at constant speed.
    pub fn following(vel: f64, gap: f64, lead_vel: f64) -> Self {
        Self {
            vel,
            gap,
            lead_vel,
            lead_acc: 0.0,
            speed_limit: f64::INFINITY,
        }
    }

    pub fn with_speed_limit(mut self, speed_limit: f64) -> Self {
        self.speed_limit = speed_limit;
        self
    }

    /// The approaching rate, positive when closing in on the leader.
    pub fn approach_rate(&self) -> f64 {
        self.vel - self.lead_vel
    }
}

/// Delays the driver's perception of the leader by a fixed number of updates.
#[derive(Clone, Debug)]
pub struct ReactionDelay {
    /// The delay in updates.
    delay: usize,
    /// Past observations, oldest first.
    history: VecDeque<LocalTraffic>,
}

impl ReactionDelay {
    /// Creates a delay buffer for the given reaction time and model update interval, both in s.
    pub fn new(reaction_time: f64, update_interval: f64) -> Self {
        let delay = if reaction_time > 0.0 && update_interval > 0.0 {
            (reaction_time / update_interval).ceil() as usize
        } else {
            0
        };
        Self {
            delay,
            history: VecDeque::with_capacity(delay + 1),
        }
    }

    /// The delay in updates.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// The number of stored observations.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Records an observation and returns the situation the driver reacts to:
    /// the leader as it was `delay` updates ago, combined with the driver's
    /// current speed and speed limit.
    pub fn observe(&mut self, traffic: LocalTraffic) -> LocalTraffic {
        if self.delay == 0 {
            return traffic;
        }
        self.history.push_back(traffic);
        while self.history.len() > self.delay + 1 {
            self.history.pop_front();
        }
        let past = self.history.front().copied().unwrap_or(traffic);
        LocalTraffic {
            vel: traffic.vel,
            speed_limit: traffic.speed_limit,
            ..past
        }
    }
}

/// A car-following model instance, owning its own state.
#[derive(Clone, Debug)]
pub enum LongitudinalModel {
    Idm(Idm),
    Acc(Acc),
    Gipps(Gipps),
    Krauss(Krauss),
    Nsm(Nsm),
    Kkw(Kkw),
    OvmFvdm(OvmFvdm),
}

impl LongitudinalModel {
    /// Builds a model from its parameter record.
    ///
    /// # Parameters
    /// * `input` - The model family and its parameters
    /// * `length` - The vehicle length in m, used by KKW only
    /// * `timestep` - The simulation timestep in s, used by Gipps and Krauss only
    pub fn build(input: &LongitudinalModelInput, length: f64, timestep: f64) -> Self {
        match input {
            LongitudinalModelInput::Idm(p) => Self::Idm(Idm::new(p)),
            LongitudinalModelInput::Acc(p) => Self::Acc(Acc::new(p)),
            LongitudinalModelInput::Gipps(p) => Self::Gipps(Gipps::new(p, timestep)),
            LongitudinalModelInput::Krauss(p) => Self::Krauss(Krauss::new(p, timestep)),
            LongitudinalModelInput::Nsm(p) => Self::Nsm(Nsm::new(p)),
            LongitudinalModelInput::Kkw(p) => Self::Kkw(Kkw::new(p, length)),
            LongitudinalModelInput::OvmFvdm(p) => Self::OvmFvdm(OvmFvdm::new(p)),
        }
    }

    /// The model family.
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Idm(_) => ModelKind::Idm,
            Self::Acc(_) => ModelKind::Acc,
            Self::Gipps(_) => ModelKind::Gipps,
            Self::Krauss(_) => ModelKind::Krauss,
            Self::Nsm(_) => ModelKind::Nsm,
            Self::Kkw(_) => ModelKind::Kkw,
            Self::OvmFvdm(_) => ModelKind::OvmFvdm,
        }
    }

    /// The desired speed in m/s.
    pub fn desired_speed(&self) -> f64 {
        match self {
            Self::Idm(m) => m.desired_speed(),
            Self::Acc(m) => m.desired_speed(),
            Self::Gipps(m) => m.desired_speed(),
            Self::Krauss(m) => m.desired_speed(),
            Self::Nsm(m) => m.desired_speed(),
            Self::Kkw(m) => m.desired_speed(),
            Self::OvmFvdm(m) => m.desired_speed(),
        }
    }

    /// Overrides the desired speed in m/s.
    pub fn set_desired_speed(&mut self, v0: f64) {
        match self {
            Self::Idm(m) => m.set_desired_speed(v0),
            Self::Acc(m) => m.set_desired_speed(v0),
            Self::Gipps(m) => m.set_desired_speed(v0),
            Self::Krauss(m) => m.set_desired_speed(v0),
            Self::Nsm(m) => m.set_desired_speed(v0),
            Self::Kkw(m) => m.set_desired_speed(v0),
            Self::OvmFvdm(m) => m.set_desired_speed(v0),
        }
    }

    /// Randomizes the desired speed by a uniformly distributed relative amount
    /// in `[-randomization, randomization)`. A zero randomization draws nothing.
    pub fn set_relative_randomization_v0<R: Rng + ?Sized>(&mut self, randomization: f64, rng: &mut R) {
        if randomization <= 0.0 {
            return;
        }
        let u = Uniform::new(-1.0, 1.0).sample(rng);
        let v0 = self.desired_speed() * (1.0 + randomization * u);
        self.set_desired_speed(v0);
    }

    /// The driver's reaction time in s, 0 for models without one.
    pub fn reaction_time(&self) -> f64 {
        match self {
            Self::Gipps(m) => m.reaction_time(),
            Self::Krauss(m) => m.reaction_time(),
            Self::Nsm(m) => m.reaction_time(),
            Self::Idm(_) | Self::Acc(_) | Self::Kkw(_) | Self::OvmFvdm(_) => 0.0,
        }
    }

    /// The reaction delay buffer, for models with reaction times.
    pub fn reaction_delay(&self) -> Option<&ReactionDelay> {
        match self {
            Self::Gipps(m) => Some(m.reaction_delay()),
            Self::Krauss(m) => Some(m.reaction_delay()),
            Self::Nsm(m) => Some(m.reaction_delay()),
            Self::Idm(_) | Self::Acc(_) | Self::Kkw(_) | Self::OvmFvdm(_) => None,
        }
    }

    /// Computes the vehicle's acceleration in m/s<sup>2</sup>.
    ///
    /// Stochastic models draw their noise from `rng`; models with a reaction time
    /// record `traffic` in their delay buffer.
    pub fn acc<R: Rng + ?Sized>(&mut self, traffic: &LocalTraffic, rng: &mut R) -> f64 {
        let acc = match self {
            Self::Idm(m) => m.acc(traffic),
            Self::Acc(m) => m.acc(traffic),
            Self::Gipps(m) => m.acc(traffic),
            Self::Krauss(m) => m.acc(traffic, rng),
            Self::Nsm(m) => m.acc(traffic, rng),
            Self::Kkw(m) => m.acc(traffic, rng),
            Self::OvmFvdm(m) => m.acc(traffic),
        };
        f64::max(acc, MAX_DECEL)
    }
}

/// The desired speed capped by the speed limit.
fn effective_v0(v0: f64, speed_limit: f64) -> f64 {
    f64::min(v0, speed_limit)
}
