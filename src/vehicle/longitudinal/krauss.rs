use super::{effective_v0, LocalTraffic, ReactionDelay};
use crate::input::KraussParams;
use rand::Rng;

/// The Krauss model: a collision-free safe speed followed by random dawdling.
#[derive(Clone, Debug)]
pub struct Krauss {
    params: KraussParams,
    v0: f64,
    dt: f64,
    delay: ReactionDelay,
}

impl Krauss {
    /// Creates a new Krauss model updated once per `timestep` seconds.
    pub fn new(params: &KraussParams, timestep: f64) -> Self {
        Self {
            params: *params,
            v0: params.v0,
            dt: timestep,
            delay: ReactionDelay::new(params.reaction_time, timestep),
        }
    }

    pub fn params(&self) -> &KraussParams {
        &self.params
    }

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

    pub fn acc<R: Rng + ?Sized>(&mut self, traffic: &LocalTraffic, rng: &mut R) -> f64 {
        let traffic = self.delay.observe(*traffic);
        let v_des = self.desired_next_speed(&traffic);
        let dawdle = self.params.epsilon * self.params.a * self.dt * rng.gen::<f64>();
        let v_new = f64::max(v_des - dawdle, 0.0);
        (v_new - traffic.vel) / self.dt
    }

    /// The speed at the next update before dawdling.
    fn desired_next_speed(&self, traffic: &LocalTraffic) -> f64 {
        let KraussParams { a, b, s0, .. } = self.params;
        let dt = self.dt;
        let v0 = effective_v0(self.v0, traffic.speed_limit);
        let (vel, lead_vel) = (traffic.vel, traffic.lead_vel);

        let gap = f64::max(traffic.gap - s0, 0.0);
        let v_safe = lead_vel + (gap - lead_vel * dt) / ((vel + lead_vel) / (2.0 * b) + dt);
        (vel + a * dt).min(v_safe).min(v0).max(0.0)
    }

    /// The mean steady-state speed at the given net gap, accounting for the
    /// average dawdling loss.
    pub(crate) fn equilibrium_speed(&self, gap: f64) -> f64 {
        let v_safe = f64::min((gap - self.params.s0) / self.dt, self.v0);
        let dawdle = 0.5 * self.params.epsilon * self.params.a * self.dt;
        f64::max(v_safe - dawdle, 0.0)
    }
}
