use super::{effective_v0, LocalTraffic, ReactionDelay};
use crate::input::NsmParams;
use rand::Rng;

/// The cell length in m.
pub const CELL_LENGTH: f64 = 7.5;

/// The update interval of the automaton in s.
pub const UPDATE_INTERVAL: f64 = 1.0;

/// The Nagel-Schreckenberg cellular automaton.
///
/// Speeds and gaps are rounded to whole cells. Each update a vehicle accelerates by
/// one cell per update, is capped by its gap and desired speed, then randomly slows
/// down by one cell.
#[derive(Clone, Debug)]
pub struct Nsm {
    params: NsmParams,
    v0: f64,
    delay: ReactionDelay,
}

impl Nsm {
    pub fn new(params: &NsmParams) -> Self {
        Self {
            params: *params,
            v0: params.v0,
            delay: ReactionDelay::new(params.reaction_time, UPDATE_INTERVAL),
        }
    }

    pub fn params(&self) -> &NsmParams {
        &self.params
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

    /// The desired speed in cells per update.
    fn max_cells(&self, speed_limit: f64) -> f64 {
        (effective_v0(self.v0, speed_limit) / CELL_LENGTH).round()
    }

    pub fn acc<R: Rng + ?Sized>(&mut self, traffic: &LocalTraffic, rng: &mut R) -> f64 {
        let traffic = self.delay.observe(*traffic);
        let vel = (traffic.vel / CELL_LENGTH).round();
        let gap = (traffic.gap / CELL_LENGTH).floor().max(0.0);

        let v_new = (vel + 1.0).min(self.max_cells(traffic.speed_limit)).min(gap);
        let p = if vel == 0.0 {
            self.params.p_slow_to_start
        } else {
            self.params.p_slowdown
        };
        let v_new = if rng.gen::<f64>() < p {
            f64::max(v_new - 1.0, 0.0)
        } else {
            v_new
        };
        (v_new * CELL_LENGTH - traffic.vel) / UPDATE_INTERVAL
    }

    /// The mean-field steady-state speed at the given net gap.
    pub(crate) fn equilibrium_speed(&self, gap: f64) -> f64 {
        let p = self.params.p_slowdown;
        let free = (self.max_cells(f64::INFINITY) - p) * CELL_LENGTH;
        let congested = (1.0 - p) * (gap / CELL_LENGTH).floor().max(0.0) * CELL_LENGTH;
        f64::max(f64::min(free, congested), 0.0) / UPDATE_INTERVAL
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deterministic() -> Nsm {
        Nsm::new(&NsmParams {
            p_slowdown: 0.0,
            p_slow_to_start: 0.0,
            ..Default::default()
        })
    }

    #[test]
    fn accelerates_one_cell() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut nsm = deterministic();
        assert_approx_eq!(nsm.acc(&LocalTraffic::free(15.0), &mut rng), CELL_LENGTH);
        assert_approx_eq!(nsm.acc(&LocalTraffic::free(37.5), &mut rng), 0.0);
    }

    #[test]
    fn stops_at_gap() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut nsm = deterministic();
        // Two free cells ahead.
        let acc = nsm.acc(&LocalTraffic::following(30.0, 16.0, 0.0), &mut rng);
        assert_approx_eq!(acc, 2.0 * CELL_LENGTH - 30.0);
    }

    #[test]
    fn slowdown_probability() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut nsm = Nsm::new(&NsmParams::default());
        let n = 10_000;
        let slowed = (0..n)
            .filter(|_| nsm.acc(&LocalTraffic::free(37.5), &mut rng) < 0.0)
            .count();
        let share = slowed as f64 / n as f64;
        assert!((share - 0.25).abs() < 0.03, "{}", share);
    }
}
