//! Fuel consumption models, shared between all vehicles of a type.

use crate::error::ConfigError;
use crate::input::ParamCheck;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The gravitational acceleration in m/s<sup>2</sup>.
const GRAVITY: f64 = 9.81;

/// The density of air in kg/m<sup>3</sup>.
const AIR_DENSITY: f64 = 1.29;

/// The usable energy per litre of fuel in J.
const FUEL_ENERGY_DENSITY: f64 = 32.0e6;

/// A fuel consumption model.
///
/// Implementations must be free of side effects, as one instance is shared by every
/// vehicle configured with its label.
pub trait FuelConsumption: fmt::Debug + Send + Sync {
    /// The instantaneous fuel flow in l/s at speed `vel` (m/s) and acceleration `acc` (m/s<sup>2</sup>).
    fn fuel_flow_liter_per_s(&self, vel: f64, acc: f64) -> f64;
}

/// The parameters of a [PhysicsConsumption] model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConsumptionInput {
    /// The label vehicle types refer to.
    pub label: String,
    /// The vehicle mass in kg.
    pub mass: f64,
    /// The aerodynamic drag coefficient.
    pub drag_coefficient: f64,
    /// The frontal area in m<sup>2</sup>.
    pub front_area: f64,
    /// The rolling resistance coefficient.
    pub rolling_resistance: f64,
    /// The fuel flow of the idling engine in l/s.
    pub idle_flow: f64,
    /// The share of the fuel energy turned into traction.
    pub efficiency: f64,
}

impl Default for FuelConsumptionInput {
    fn default() -> Self {
        Self {
            label: String::new(),
            mass: 1500.0,
            drag_coefficient: 0.32,
            front_area: 2.2,
            rolling_resistance: 0.015,
            idle_flow: 0.0003,
            efficiency: 0.3,
        }
    }
}

impl FuelConsumptionInput {
    /// Creates a record with default parameters.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self, errors: &mut Vec<ConfigError>) {
        ParamCheck::new(&self.label, errors)
            .positive("mass", self.mass)
            .non_negative("drag_coefficient", self.drag_coefficient)
            .non_negative("front_area", self.front_area)
            .non_negative("rolling_resistance", self.rolling_resistance)
            .non_negative("idle_flow", self.idle_flow)
            .positive("efficiency", self.efficiency)
            .probability("efficiency", self.efficiency);
    }
}

/// Fuel flow from the traction power balance.
///
/// The engine idles whenever no traction power is needed; otherwise the fuel flow
/// grows linearly with the power spent on inertia, rolling resistance and drag.
#[derive(Clone, Debug)]
pub struct PhysicsConsumption {
    params: FuelConsumptionInput,
}

impl PhysicsConsumption {
    pub fn new(params: &FuelConsumptionInput) -> Self {
        Self {
            params: params.clone(),
        }
    }

    pub fn params(&self) -> &FuelConsumptionInput {
        &self.params
    }

    /// The traction power in W.
    pub fn power(&self, vel: f64, acc: f64) -> f64 {
        let p = &self.params;
        let force = p.mass * acc
            + p.mass * GRAVITY * p.rolling_resistance
            + 0.5 * AIR_DENSITY * p.drag_coefficient * p.front_area * vel * vel;
        force * vel
    }
}

impl FuelConsumption for PhysicsConsumption {
    fn fuel_flow_liter_per_s(&self, vel: f64, acc: f64) -> f64 {
        let power = f64::max(self.power(vel, acc), 0.0);
        self.params.idle_flow + power / (self.params.efficiency * FUEL_ENERGY_DENSITY)
    }
}

/// The fuel consumption models, keyed by label.
#[derive(Clone, Debug, Default)]
pub struct ConsumptionModels {
    models: HashMap<String, Arc<dyn FuelConsumption>>,
}

impl ConsumptionModels {
    /// Builds a [PhysicsConsumption] model for every record.
    pub fn new(inputs: &[FuelConsumptionInput]) -> Self {
        let mut models = Self::default();
        for input in inputs {
            models.insert(&input.label, Arc::new(PhysicsConsumption::new(input)));
        }
        models
    }

    /// Registers a model, replacing any model with the same label.
    pub fn insert(&mut self, label: impl Into<String>, model: Arc<dyn FuelConsumption>) {
        self.models.insert(label.into(), model);
    }

    pub fn get(&self, label: &str) -> Option<Arc<dyn FuelConsumption>> {
        self.models.get(label).cloned()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.models.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
