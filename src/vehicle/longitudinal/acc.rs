use super::{effective_v0, Idm, LocalTraffic, MAX_DECEL};
use crate::input::AccParams;

/// The adaptive cruise control model.
///
/// Blends the IDM with the constant-acceleration heuristic (CAH), which assumes the
/// leader keeps its current acceleration. The blend only softens braking: whenever
/// the IDM alone asks for more acceleration than the CAH, the IDM wins.
#[derive(Clone, Debug)]
pub struct Acc {
    params: AccParams,
    idm: Idm,
}

impl Acc {
    pub fn new(params: &AccParams) -> Self {
        Self {
            params: *params,
            idm: Idm::new(&params.idm()),
        }
    }

    pub fn params(&self) -> &AccParams {
        &self.params
    }

    pub fn desired_speed(&self) -> f64 {
        self.idm.desired_speed()
    }

    pub fn set_desired_speed(&mut self, v0: f64) {
        self.idm.set_desired_speed(v0);
    }

    pub fn acc(&self, traffic: &LocalTraffic) -> f64 {
        let v0 = effective_v0(self.desired_speed(), traffic.speed_limit);
        let lead_acc = f64::min(traffic.lead_acc, self.params.a);
        self.calc_acc(traffic.gap, traffic.vel, traffic.lead_vel, lead_acc, v0)
    }

    pub(crate) fn calc_acc(&self, gap: f64, vel: f64, lead_vel: f64, lead_acc: f64, v0: f64) -> f64 {
        if gap <= 0.0 {
            return MAX_DECEL;
        }
        let acc_idm = self.idm.calc_acc(gap, vel, vel - lead_vel, v0);
        let acc_cah = cah(gap, vel, lead_vel, lead_acc);
        if acc_idm >= acc_cah {
            return acc_idm;
        }
        let c = self.params.coolness;
        let b = self.params.b;
        (1.0 - c) * acc_idm + c * (acc_cah + b * ((acc_idm - acc_cah) / b).tanh())
    }
}

/// The constant-acceleration heuristic.
fn cah(gap: f64, vel: f64, lead_vel: f64, lead_acc: f64) -> f64 {
    if !gap.is_finite() {
        return lead_acc;
    }
    let dv = vel - lead_vel;
    let denom = lead_vel * lead_vel - 2.0 * gap * lead_acc;
    if lead_vel * dv <= -2.0 * gap * lead_acc && denom > 0.0 {
        vel * vel * lead_acc / denom
    } else {
        lead_acc - f64::max(dv, 0.0).powi(2) / (2.0 * gap)
    }
}
