use super::{effective_v0, LocalTraffic, ReactionDelay};
use crate::input::GippsParams;

/// The Gipps model.
///
/// An iterated map: each timestep the driver picks the largest speed that allows a
/// stop behind the leader should it brake at the comfortable deceleration.
#[derive(Clone, Debug)]
pub struct Gipps {
    params: GippsParams,
    v0: f64,
    /// The update interval in s.
    dt: f64,
    delay: ReactionDelay,
}

impl Gipps {
    /// Creates a new Gipps model updated once per `timestep` seconds.
    pub fn new(params: &GippsParams, timestep: f64) -> Self {
        Self {
            params: *params,
            v0: params.v0,
            dt: timestep,
            delay: ReactionDelay::new(params.reaction_time, timestep),
        }
    }

    pub fn params(&self) -> &GippsParams {
        &self.params
    }

    /// The update interval in s.
    pub fn timestep(&self) -> f64 {
        self.dt
    }

    pub fn desired_speed(&self) -> f64 {
        self.v0
    }

    pub fn set_desired_speed(&mut self, v0: f64) {
        self.v0 = v0;
    }

    pub fn reaction_time(&self) -> f64 {
        self.params.reaction_time
    }

    pub fn reaction_delay(&self) -> &ReactionDelay {
        &self.delay
    }

    pub fn acc(&mut self, traffic: &LocalTraffic) -> f64 {
        let traffic = self.delay.observe(*traffic);
        let GippsParams { a, b, s0, .. } = self.params;
        let dt = self.dt;
        let v0 = effective_v0(self.v0, traffic.speed_limit);

        let gap = f64::max(traffic.gap - s0, 0.0);
        let v_safe = -b * dt + (b * b * dt * dt + traffic.lead_vel.powi(2) + 2.0 * b * gap).sqrt();
        let v_new = (traffic.vel + a * dt).min(v_safe).min(v0).max(0.0);
        (v_new - traffic.vel) / dt
    }

    /// The steady-state speed at the given net gap.
    pub(crate) fn equilibrium_speed(&self, gap: f64) -> f64 {
        ((gap - self.params.s0) / self.dt).clamp(0.0, self.v0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn accelerates_at_max_rate() {
        let mut gipps = Gipps::new(&GippsParams::default(), 0.5);
        assert_approx_eq!(gipps.acc(&LocalTraffic::free(10.0)), 1.5);
    }

    #[test]
    fn holds_equilibrium() {
        let mut gipps = Gipps::new(&GippsParams::default(), 1.0);
        let vel = gipps.equilibrium_speed(22.0);
        assert_approx_eq!(vel, 20.0);
        assert_approx_eq!(gipps.acc(&LocalTraffic::following(vel, 22.0, vel)), 0.0);
    }

    #[test]
    fn reaction_time_delays_braking() {
        let params = GippsParams {
            reaction_time: 1.0,
            ..Default::default()
        };
        let mut gipps = Gipps::new(&params, 0.5);
        assert_eq!(gipps.reaction_delay().delay(), 2);
        gipps.acc(&LocalTraffic::free(10.0));
        gipps.acc(&LocalTraffic::free(10.0));
        // The obstacle appears now but is only seen two updates later.
        let acc = gipps.acc(&LocalTraffic::following(10.0, 5.0, 0.0));
        assert!(acc > 0.0);
        gipps.acc(&LocalTraffic::following(10.0, 5.0, 0.0));
        let acc = gipps.acc(&LocalTraffic::following(10.0, 5.0, 0.0));
        assert!(acc < 0.0);
        assert_eq!(gipps.reaction_delay().len(), 3);
    }
}
