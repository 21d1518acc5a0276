use super::{effective_v0, LocalTraffic};
use crate::input::KkwParams;
use rand::Rng;
use std::cmp::Ordering;

/// The cell length in m.
pub const CELL_LENGTH: f64 = 0.5;

/// The update interval of the automaton in s.
pub const UPDATE_INTERVAL: f64 = 1.0;

/// The Kerner-Klenov-Wolf cellular automaton.
///
/// When the net gap is below the synchronization distance `D(v) = d + k v` a driver
/// adapts its speed to the leader instead of accelerating freely. The vehicle length
/// `d` is part of the model, so it is fixed when the model is built.
#[derive(Clone, Debug)]
pub struct Kkw {
    params: KkwParams,
    v0: f64,
    /// The vehicle length in cells.
    length: f64,
}

impl Kkw {
    /// Creates a new KKW model for a vehicle of the given length in m.
    pub fn new(params: &KkwParams, length: f64) -> Self {
        Self {
            params: *params,
            v0: params.v0,
            length: (length / CELL_LENGTH).round(),
        }
    }

    pub fn params(&self) -> &KkwParams {
        &self.params
    }

    /// The vehicle length in m, rounded to whole cells.
    pub fn length(&self) -> f64 {
        self.length * CELL_LENGTH
    }

    pub fn desired_speed(&self) -> f64 {
        self.v0
    }

    pub fn set_desired_speed(&mut self, v0: f64) {
        self.v0 = v0;
    }

    /// The synchronization distance in cells.
    fn sync_distance(&self, vel: f64) -> f64 {
        self.length + self.params.k * vel * UPDATE_INTERVAL
    }

    pub fn acc<R: Rng + ?Sized>(&mut self, traffic: &LocalTraffic, rng: &mut R) -> f64 {
        let KkwParams {
            pb0, pb1, pa1, pa2, ..
        } = self.params;
        let vel = (traffic.vel / CELL_LENGTH).round();
        let lead_vel = (traffic.lead_vel / CELL_LENGTH).round();
        let gap = (traffic.gap / CELL_LENGTH).floor().max(0.0);
        let v_free = (effective_v0(self.v0, traffic.speed_limit) / CELL_LENGTH).round();
        let vp = (self.params.vp / CELL_LENGTH).round();

        // Deterministic step
        let v_c = if gap >= self.sync_distance(vel) {
            vel + 1.0
        } else {
            match lead_vel.partial_cmp(&vel) {
                Some(Ordering::Greater) => vel + 1.0,
                Some(Ordering::Less) => vel - 1.0,
                _ => vel,
            }
        };
        let v_tilde = v_c.min(v_free).min(gap).max(0.0);

        // Stochastic step
        let pb = if vel == 0.0 { pb0 } else { pb1 };
        let pa = if vel < vp { pa1 } else { pa2 };
        let r = rng.gen::<f64>();
        let eta = if r < pb {
            -1.0
        } else if r < pb + pa {
            1.0
        } else {
            0.0
        };

        let v_new = (v_tilde + eta).min(vel + 1.0).min(v_free).min(gap).max(0.0);
        (v_new * CELL_LENGTH - traffic.vel) / UPDATE_INTERVAL
    }

    /// The upper boundary of the steady states at the given net gap.
    pub(crate) fn equilibrium_speed(&self, gap: f64) -> f64 {
        let v_free = (self.v0 / CELL_LENGTH).round() * CELL_LENGTH;
        let congested = (gap / CELL_LENGTH).floor().max(0.0) * CELL_LENGTH;
        f64::min(v_free, congested) / UPDATE_INTERVAL
    }
}
