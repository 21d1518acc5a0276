use super::{effective_v0, LocalTraffic};
use crate::input::OvmFvdmParams;

/// The optimal velocity model, extended by the full velocity difference term.
#[derive(Clone, Debug)]
pub struct OvmFvdm {
    params: OvmFvdmParams,
    v0: f64,
}

impl OvmFvdm {
    pub fn new(params: &OvmFvdmParams) -> Self {
        Self {
            params: *params,
            v0: params.v0,
        }
    }

    pub fn params(&self) -> &OvmFvdmParams {
        &self.params
    }

    pub fn desired_speed(&self) -> f64 {
        self.v0
    }

    pub fn set_desired_speed(&mut self, v0: f64) {
        self.v0 = v0;
    }

    pub fn acc(&self, traffic: &LocalTraffic) -> f64 {
        let v0 = effective_v0(self.v0, traffic.speed_limit);
        let v_opt = self.optimal_velocity(traffic.gap, v0);
        (v_opt - traffic.vel) / self.params.tau - self.params.lambda * traffic.approach_rate()
    }

    /// The Bando optimal velocity function.
    pub(crate) fn optimal_velocity(&self, gap: f64, v0: f64) -> f64 {
        let OvmFvdmParams {
            s0,
            transition_width,
            beta,
            ..
        } = self.params;
        if !gap.is_finite() {
            return v0;
        }
        let shape = ((gap - s0) / transition_width - beta).tanh() + beta.tanh();
        f64::max(v0 * shape / (1.0 + beta.tanh()), 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn optimal_velocity_shape() {
        let ovm = OvmFvdm::new(&OvmFvdmParams::default());
        assert_approx_eq!(ovm.optimal_velocity(2.0, 16.0), 0.0);
        assert_approx_eq!(ovm.optimal_velocity(1.0, 16.0), 0.0);
        assert_approx_eq!(ovm.optimal_velocity(f64::INFINITY, 16.0), 16.0);
        assert!(ovm.optimal_velocity(20.0, 16.0) < ovm.optimal_velocity(30.0, 16.0));
    }

    #[test]
    fn velocity_difference_term() {
        let params = OvmFvdmParams {
            lambda: 0.5,
            ..Default::default()
        };
        let fvdm = OvmFvdm::new(&params);
        let ovm = OvmFvdm::new(&OvmFvdmParams::default());
        let traffic = LocalTraffic::following(10.0, 20.0, 8.0);
        assert_approx_eq!(fvdm.acc(&traffic), ovm.acc(&traffic) - 1.0);
    }
}
