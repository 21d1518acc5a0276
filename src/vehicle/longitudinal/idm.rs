use super::{effective_v0, LocalTraffic, MAX_DECEL};
use crate::input::IdmParams;

/// The intelligent driver model.
#[derive(Clone, Debug)]
pub struct Idm {
    params: IdmParams,
    /// The (possibly randomized) desired speed in m/s.
    v0: f64,
}

impl Idm {
    /// Creates a new IDM instance.
    pub fn new(params: &IdmParams) -> Self {
        Self {
            params: *params,
            v0: params.v0,
        }
    }

    pub fn params(&self) -> &IdmParams {
        &self.params
    }

    pub fn desired_speed(&self) -> f64 {
        self.v0
    }

    pub fn set_desired_speed(&mut self, v0: f64) {
        self.v0 = v0;
    }

    /// Calculates the acceleration needed to follow the vehicle ahead.
    pub fn acc(&self, traffic: &LocalTraffic) -> f64 {
        let v0 = effective_v0(self.v0, traffic.speed_limit);
        self.calc_acc(traffic.gap, traffic.vel, traffic.approach_rate(), v0)
    }

    /// Computes an acceleration using the intelligent driver model.
    ///
    /// # Arguments
    /// * `gap` - The net distance to the vehicle ahead in m.
    /// * `vel` - The velocity of the simulated vehicle (m/s).
    /// * `dv` - The approaching rate to the vehicle ahead (m/s).
    /// * `v0` - The desired speed (m/s).
    pub(crate) fn calc_acc(&self, gap: f64, vel: f64, dv: f64, v0: f64) -> f64 {
        let IdmParams {
            a, b, s0, s1, time_gap, delta, ..
        } = self.params;

        if gap <= 0.0 {
            return MAX_DECEL;
        }
        let s_star = s0 + s1 * (vel / v0).sqrt() + f64::max(vel * time_gap + vel * dv / (2.0 * (a * b).sqrt()), 0.0);
        let term = s_star / gap;
        a * (1.0 - (vel / v0).powf(delta) - term * term)
    }
}
