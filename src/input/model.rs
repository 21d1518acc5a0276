use super::ParamCheck;
use crate::error::ConfigError;
use crate::vehicle::ModelKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The parameters of a longitudinal model, tagged by model family.
///
/// In JSON the family is the `"model"` field, next to the parameters:
/// `{ "model": "IDM", "v0": 30.0, "T": 1.2 }`. Omitted parameters take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LongitudinalModelInput {
    Idm(IdmParams),
    Acc(AccParams),
    Gipps(GippsParams),
    Krauss(KraussParams),
    Nsm(NsmParams),
    Kkw(KkwParams),
    OvmFvdm(OvmFvdmParams),
}

/// The parameters of the intelligent driver model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdmParams {
    /// The desired speed in m/s.
    pub v0: f64,
    /// The maximum acceleration in m/s<sup>2</sup>.
    pub a: f64,
    /// The comfortable deceleration in m/s<sup>2</sup>.
    pub b: f64,
    /// The minimum gap at standstill in m.
    pub s0: f64,
    /// The speed-dependent jam distance in m.
    pub s1: f64,
    /// The desired time gap in s.
    #[serde(alias = "T")]
    pub time_gap: f64,
    /// The acceleration exponent.
    pub delta: f64,
}

/// The parameters of the adaptive cruise control model:
/// the IDM blended with the constant-acceleration heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccParams {
    pub v0: f64,
    pub a: f64,
    pub b: f64,
    pub s0: f64,
    pub s1: f64,
    #[serde(alias = "T")]
    pub time_gap: f64,
    pub delta: f64,
    /// The coolness factor in `[0, 1]`; 0 reduces the model to the IDM.
    pub coolness: f64,
}

/// The parameters of the Gipps model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GippsParams {
    pub v0: f64,
    pub a: f64,
    pub b: f64,
    pub s0: f64,
    /// The driver's reaction time in s, 0 for none.
    pub reaction_time: f64,
}

/// The parameters of the Krauss model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KraussParams {
    pub v0: f64,
    pub a: f64,
    pub b: f64,
    pub s0: f64,
    /// The dawdling factor in `[0, 1]`.
    pub epsilon: f64,
    pub reaction_time: f64,
}

/// The parameters of the Nagel-Schreckenberg cellular automaton.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NsmParams {
    /// The desired speed in m/s, rounded to whole cells per update.
    pub v0: f64,
    /// The probability of random slowdown.
    pub p_slowdown: f64,
    /// The slowdown probability of a stopped vehicle.
    pub p_slow_to_start: f64,
    pub reaction_time: f64,
}

/// The parameters of the Kerner-Klenov-Wolf cellular automaton.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KkwParams {
    /// The desired speed in m/s.
    pub v0: f64,
    /// The synchronization distance factor.
    pub k: f64,
    /// The slowdown probability of a stopped vehicle.
    pub pb0: f64,
    /// The slowdown probability of a moving vehicle.
    pub pb1: f64,
    /// The acceleration probability below `vp`.
    pub pa1: f64,
    /// The acceleration probability at or above `vp`.
    pub pa2: f64,
    /// The speed separating `pa1` and `pa2`, in m/s.
    pub vp: f64,
}

/// The parameters of the optimal velocity / full velocity difference model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvmFvdmParams {
    pub v0: f64,
    pub s0: f64,
    /// The speed relaxation time in s.
    pub tau: f64,
    /// The width of the transition region of the optimal velocity function, in m.
    pub transition_width: f64,
    /// The form factor of the optimal velocity function.
    pub beta: f64,
    /// The sensitivity to the speed difference, in 1/s. 0 gives the plain OVM.
    pub lambda: f64,
}

impl Default for IdmParams {
    fn default() -> Self {
        Self {
            v0: 33.3,
            a: 1.0,
            b: 1.5,
            s0: 2.0,
            s1: 0.0,
            time_gap: 1.5,
            delta: 4.0,
        }
    }
}

impl Default for AccParams {
    fn default() -> Self {
        let idm = IdmParams::default();
        Self {
            v0: idm.v0,
            a: idm.a,
            b: idm.b,
            s0: idm.s0,
            s1: idm.s1,
            time_gap: idm.time_gap,
            delta: idm.delta,
            coolness: 0.99,
        }
    }
}

impl AccParams {
    /// The parameters of the underlying IDM.
    pub fn idm(&self) -> IdmParams {
        IdmParams {
            v0: self.v0,
            a: self.a,
            b: self.b,
            s0: self.s0,
            s1: self.s1,
            time_gap: self.time_gap,
            delta: self.delta,
        }
    }
}

impl Default for GippsParams {
    fn default() -> Self {
        Self {
            v0: 33.3,
            a: 1.5,
            b: 1.0,
            s0: 2.0,
            reaction_time: 0.0,
        }
    }
}

impl Default for KraussParams {
    fn default() -> Self {
        Self {
            v0: 33.3,
            a: 1.0,
            b: 1.5,
            s0: 2.0,
            epsilon: 0.4,
            reaction_time: 0.0,
        }
    }
}

impl Default for NsmParams {
    fn default() -> Self {
        Self {
            v0: 37.5,
            p_slowdown: 0.25,
            p_slow_to_start: 0.25,
            reaction_time: 0.0,
        }
    }
}

impl Default for KkwParams {
    fn default() -> Self {
        Self {
            v0: 30.0,
            k: 2.55,
            pb0: 0.425,
            pb1: 0.04,
            pa1: 0.2,
            pa2: 0.052,
            vp: 14.0,
        }
    }
}

impl Default for OvmFvdmParams {
    fn default() -> Self {
        Self {
            v0: 16.0,
            s0: 2.0,
            tau: 0.65,
            transition_width: 8.0,
            beta: 1.5,
            lambda: 0.0,
        }
    }
}

impl LongitudinalModelInput {
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

    /// The default parameterization of a model family.
    pub fn with_defaults(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Idm => Self::Idm(Default::default()),
            ModelKind::Acc => Self::Acc(Default::default()),
            ModelKind::Gipps => Self::Gipps(Default::default()),
            ModelKind::Krauss => Self::Krauss(Default::default()),
            ModelKind::Nsm => Self::Nsm(Default::default()),
            ModelKind::Kkw => Self::Kkw(Default::default()),
            ModelKind::OvmFvdm => Self::OvmFvdm(Default::default()),
        }
    }

    /// Resolves a JSON model record of the vehicle type `label`.
    ///
    /// The `"model"` identifier is matched case-insensitively; an identifier naming
    /// no supported family is reported as [ConfigError::UnknownModel].
    pub(crate) fn from_value(label: &str, mut value: Value) -> Result<Self, ConfigError> {
        let model = value
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let kind: ModelKind = model.parse().map_err(|_| ConfigError::UnknownModel {
            label: label.to_owned(),
            model,
        })?;
        if let Some(record) = value.as_object_mut() {
            record.insert("model".to_owned(), Value::from(kind.name()));
        }
        serde_json::from_value(value).map_err(|source| ConfigError::InvalidModelRecord {
            label: label.to_owned(),
            source,
        })
    }

    pub(crate) fn validate(&self, check: &mut ParamCheck) {
        match self {
            Self::Idm(p) => {
                check
                    .positive("v0", p.v0)
                    .positive("a", p.a)
                    .positive("b", p.b)
                    .non_negative("s0", p.s0)
                    .non_negative("s1", p.s1)
                    .non_negative("T", p.time_gap)
                    .positive("delta", p.delta);
            }
            Self::Acc(p) => {
                check
                    .positive("v0", p.v0)
                    .positive("a", p.a)
                    .positive("b", p.b)
                    .non_negative("s0", p.s0)
                    .non_negative("s1", p.s1)
                    .non_negative("T", p.time_gap)
                    .positive("delta", p.delta)
                    .probability("coolness", p.coolness);
            }
            Self::Gipps(p) => {
                check
                    .positive("v0", p.v0)
                    .positive("a", p.a)
                    .positive("b", p.b)
                    .non_negative("s0", p.s0)
                    .non_negative("reaction_time", p.reaction_time);
            }
            Self::Krauss(p) => {
                check
                    .positive("v0", p.v0)
                    .positive("a", p.a)
                    .positive("b", p.b)
                    .non_negative("s0", p.s0)
                    .probability("epsilon", p.epsilon)
                    .non_negative("reaction_time", p.reaction_time);
            }
            Self::Nsm(p) => {
                check
                    .positive("v0", p.v0)
                    .probability("p_slowdown", p.p_slowdown)
                    .probability("p_slow_to_start", p.p_slow_to_start)
                    .non_negative("reaction_time", p.reaction_time);
            }
            Self::Kkw(p) => {
                check
                    .positive("v0", p.v0)
                    .non_negative("k", p.k)
                    .probability("pb0", p.pb0)
                    .probability("pb1", p.pb1)
                    .probability("pa1", p.pa1)
                    .probability("pa2", p.pa2)
                    .non_negative("vp", p.vp);
                if p.pb0 + p.pa1 > 1.0 || p.pb1 + p.pa2 > 1.0 {
                    check.probability("pb + pa", f64::max(p.pb0 + p.pa1, p.pb1 + p.pa2));
                }
            }
            Self::OvmFvdm(p) => {
                check
                    .positive("v0", p.v0)
                    .non_negative("s0", p.s0)
                    .positive("tau", p.tau)
                    .positive("transition_width", p.transition_width)
                    .non_negative("beta", p.beta)
                    .non_negative("lambda", p.lambda);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_kind_has_defaults() {
        for kind in ModelKind::ALL {
            assert_eq!(LongitudinalModelInput::with_defaults(kind).kind(), kind);
        }
    }

    #[test]
    fn defaults_are_valid() {
        for kind in ModelKind::ALL {
            let mut errors = vec![];
            LongitudinalModelInput::with_defaults(kind).validate(&mut ParamCheck::new("x", &mut errors));
            assert!(errors.is_empty(), "{:?}: {:?}", kind, errors);
        }
    }

    #[test]
    fn accepts_any_case_and_aliases() {
        let value = serde_json::json!({ "model": "ovm_fvdm", "tau": 0.8 });
        let input = LongitudinalModelInput::from_value("x", value).unwrap();
        assert_eq!(input.kind(), ModelKind::OvmFvdm);

        let value = serde_json::json!({ "model": "ACC", "T": 1.1 });
        match LongitudinalModelInput::from_value("x", value).unwrap() {
            LongitudinalModelInput::Acc(p) => {
                assert_eq!(p.time_gap, 1.1);
                assert_eq!(p.coolness, 0.99);
            }
            other => panic!("unexpected model {:?}", other),
        }
    }

    #[test]
    fn bad_parameter_types_are_reported() {
        let value = serde_json::json!({ "model": "IDM", "v0": "fast" });
        let err = LongitudinalModelInput::from_value("car", value).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidModelRecord { label, .. } if label == "car"));
    }

    #[test]
    fn serializes_with_model_tag() {
        let json = serde_json::to_value(LongitudinalModelInput::OvmFvdm(Default::default())).unwrap();
        assert_eq!(json["model"], "OVM_FVDM");
    }
}
