//! Equilibrium properties (the fundamental diagram) of a parameterized car-following model.

use super::longitudinal::{LongitudinalModel, ModelKind};
use crate::math::{bisect, LookupTable};
use crate::util::Interval;

/// The number of density samples of the tabulated equilibrium speed.
const NUM_SAMPLES: usize = 201;

/// The speed resolution of numerically solved equilibria, in m/s.
const SPEED_TOLERANCE: f64 = 1e-6;

/// The equilibrium speed-density relation of one model parameterization.
///
/// Built from a specific model instance and vehicle length; the model family it was
/// built for is reported by [EquilibriumProperties::kind].
#[derive(Clone, Debug)]
pub struct EquilibriumProperties {
    kind: ModelKind,
    length: f64,
    /// Equilibrium speed in m/s over density in vehicles/m.
    v_eq: LookupTable,
    q_max: f64,
    rho_q_max: f64,
}

/// One point of the fundamental diagram.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiagramPoint {
    /// The density in vehicles/m.
    pub rho: f64,
    /// The equilibrium speed in m/s.
    pub vel: f64,
    /// The flow in vehicles/s.
    pub flow: f64,
}

impl EquilibriumProperties {
    /// Computes the equilibrium properties of `model` for vehicles of the given length in m.
    pub fn new(length: f64, model: &LongitudinalModel) -> Self {
        let (kind, v_eq) = match model {
            LongitudinalModel::Idm(m) => {
                let v0 = m.desired_speed();
                let speed = |gap| solve(v0, |vel| m.calc_acc(gap, vel, 0.0, v0));
                (ModelKind::Idm, tabulate(length, speed))
            }
            LongitudinalModel::Acc(m) => {
                let v0 = m.desired_speed();
                let speed = |gap| solve(v0, |vel| m.calc_acc(gap, vel, vel, 0.0, v0));
                (ModelKind::Acc, tabulate(length, speed))
            }
            LongitudinalModel::Gipps(m) => (ModelKind::Gipps, tabulate(length, |gap| m.equilibrium_speed(gap))),
            LongitudinalModel::Krauss(m) => (ModelKind::Krauss, tabulate(length, |gap| m.equilibrium_speed(gap))),
            LongitudinalModel::Nsm(m) => (ModelKind::Nsm, tabulate(length, |gap| m.equilibrium_speed(gap))),
            LongitudinalModel::Kkw(m) => (ModelKind::Kkw, tabulate(length, |gap| m.equilibrium_speed(gap))),
            LongitudinalModel::OvmFvdm(m) => {
                let v0 = m.desired_speed();
                (ModelKind::OvmFvdm, tabulate(length, |gap| m.optimal_velocity(gap, v0)))
            }
        };

        let (rho_q_max, q_max) = v_eq
            .iter()
            .map(|(rho, vel)| (rho, rho * vel))
            .fold((0.0, 0.0), |best, point| if point.1 > best.1 { point } else { best });

        Self {
            kind,
            length,
            v_eq,
            q_max,
            rho_q_max,
        }
    }

    /// The model family these properties were computed for.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// The vehicle length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The jam density in vehicles/m.
    pub fn rho_max(&self) -> f64 {
        self.v_eq.range().max
    }

    /// The equilibrium speed at density `rho`, in m/s.
    pub fn v_eq(&self, rho: f64) -> f64 {
        self.v_eq.sample(rho)
    }

    /// The equilibrium flow at density `rho`, in vehicles/s.
    pub fn flow(&self, rho: f64) -> f64 {
        rho * self.v_eq(rho)
    }

    /// The maximum flow (capacity) in vehicles/s.
    pub fn q_max(&self) -> f64 {
        self.q_max
    }

    /// The density at which the maximum flow is reached, in vehicles/m.
    pub fn rho_q_max(&self) -> f64 {
        self.rho_q_max
    }

    /// The tabulated fundamental diagram, ordered by density.
    pub fn fundamental_diagram(&self) -> impl Iterator<Item = DiagramPoint> + '_ {
        self.v_eq.iter().map(|(rho, vel)| DiagramPoint {
            rho,
            vel,
            flow: rho * vel,
        })
    }
}

/// Tabulates the equilibrium speed over density, given the speed as a function of the net gap.
fn tabulate(length: f64, speed: impl Fn(f64) -> f64) -> LookupTable {
    let rho_max = 1.0 / length;
    LookupTable::from_samples(Interval::new(0.0, rho_max), NUM_SAMPLES, |rho| {
        let gap = if rho > 0.0 {
            1.0 / rho - length
        } else {
            f64::INFINITY
        };
        speed(gap)
    })
}

/// Solves `acc(vel) = 0` for the steady-state speed in `[0, v0]`.
fn solve(v0: f64, acc: impl Fn(f64) -> f64) -> f64 {
    bisect(Interval::new(0.0, v0), SPEED_TOLERANCE, acc)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::input::{IdmParams, LongitudinalModelInput};
    use assert_approx_eq::assert_approx_eq;

    fn properties(kind: ModelKind) -> (LongitudinalModel, EquilibriumProperties) {
        let model = LongitudinalModel::build(&LongitudinalModelInput::with_defaults(kind), 5.0, 0.5);
        let eq = EquilibriumProperties::new(5.0, &model);
        (model, eq)
    }

    #[test]
    fn pairs_every_family() {
        for kind in ModelKind::ALL {
            let (model, eq) = properties(kind);
            assert_eq!(eq.kind(), model.kind());
        }
    }

    #[test]
    fn diagram_shape() {
        for kind in ModelKind::ALL {
            let (model, eq) = properties(kind);
            assert_approx_eq!(eq.rho_max(), 0.2);
            assert!(eq.v_eq(0.0) <= model.desired_speed() + 1e-6, "{}", kind);
            assert!(eq.v_eq(0.0) > 0.0, "{}", kind);
            assert_approx_eq!(eq.v_eq(eq.rho_max()), 0.0);
            assert!(eq.q_max() > 0.0, "{}", kind);
            assert!(eq.rho_q_max() > 0.0 && eq.rho_q_max() < eq.rho_max(), "{}", kind);

            // Speed never increases with density
            let speeds: Vec<_> = eq.fundamental_diagram().map(|p| p.vel).collect();
            assert!(speeds.windows(2).all(|w| w[1] <= w[0] + 1e-5), "{}", kind);
        }
    }

    #[test]
    fn idm_equilibrium_is_steady() {
        let model = LongitudinalModel::build(
            &LongitudinalModelInput::Idm(IdmParams::default()),
            5.0,
            0.2,
        );
        let eq = EquilibriumProperties::new(5.0, &model);
        let LongitudinalModel::Idm(idm) = &model else {
            unreachable!()
        };
        let rho = 0.04;
        let vel = eq.v_eq(rho);
        let gap = 1.0 / rho - 5.0;
        assert!(idm.calc_acc(gap, vel, 0.0, idm.desired_speed()).abs() < 0.05);
        assert_approx_eq!(eq.flow(rho), rho * vel);
    }

    #[test]
    fn uses_randomized_desired_speed() {
        let input = LongitudinalModelInput::with_defaults(ModelKind::OvmFvdm);
        let mut model = LongitudinalModel::build(&input, 5.0, 0.2);
        model.set_desired_speed(10.0);
        let eq = EquilibriumProperties::new(5.0, &model);
        assert_approx_eq!(eq.v_eq(0.0), 10.0);
    }
}
