//! Configuration records for vehicle types and the traffic composition.

pub use model::{
    AccParams, GippsParams, IdmParams, KkwParams, KraussParams, LongitudinalModelInput, NsmParams,
    OvmFvdmParams,
};

use crate::consumption::{ConsumptionModels, FuelConsumptionInput};
use crate::error::{ConfigError, ConfigErrors};
use crate::util::Interval;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::Read;

mod model;

/// The seed used when a configuration does not specify one.
const DEFAULT_SEED: u64 = 42;

/// The description of a single vehicle type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleInput {
    /// The unique label of the vehicle type.
    pub label: String,
    /// The vehicle length in m.
    pub length: f64,
    /// The car-following model and its parameters.
    pub longitudinal_model: LongitudinalModelInput,
    /// The lane-changing parameters.
    #[serde(default)]
    pub lane_change: LaneChangeInput,
    /// The label of the fuel consumption model, if the type has one.
    #[serde(default)]
    pub fuel_consumption: Option<String>,
}

/// The parameters of the MOBIL lane-changing model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneChangeInput {
    /// The weight given to the acceleration changes of other drivers.
    pub politeness: f64,
    /// The net acceleration gain required before changing lanes, in m/s<sup>2</sup>.
    pub threshold_acc: f64,
    /// The acceleration bias towards the right lane, in m/s<sup>2</sup>.
    pub bias_right: f64,
    /// The largest deceleration that may be imposed on the new follower, in m/s<sup>2</sup>.
    pub safe_deceleration: f64,
    /// The minimum gap to the front and back in the target lane, in m.
    pub min_gap: f64,
}

impl Default for LaneChangeInput {
    fn default() -> Self {
        Self {
            politeness: 0.1,
            threshold_acc: 0.2,
            bias_right: 0.1,
            safe_deceleration: 4.0,
            min_gap: 2.0,
        }
    }
}

/// One entry of the traffic composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositionEntry {
    /// The label of the vehicle type.
    pub label: String,
    /// The raw population share. Shares are normalized over the whole composition.
    pub fraction: f64,
    /// The relative randomization of the desired speed, in `[0, 1)`.
    #[serde(default)]
    pub relative_randomization_v0: f64,
}

/// Everything needed to set up a vehicle population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationInput {
    /// The simulation timestep in s.
    pub timestep: f64,
    /// The seed of the generator's own random stream.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// The vehicle types.
    pub vehicles: Vec<VehicleInput>,
    /// The traffic composition, in sampling order.
    pub composition: Vec<CompositionEntry>,
    /// The fuel consumption models referenced by vehicle types.
    #[serde(default)]
    pub fuel_consumption: Vec<FuelConsumptionInput>,
    /// Vehicle types read from a file whose model record could not be resolved.
    #[serde(skip)]
    rejected: Vec<RawVehicleInput>,
}

/// A vehicle type as read from a file, before its model record is resolved.
#[derive(Clone, Debug, Deserialize)]
struct RawVehicleInput {
    label: String,
    length: f64,
    longitudinal_model: serde_json::Value,
    #[serde(default)]
    lane_change: LaneChangeInput,
    #[serde(default)]
    fuel_consumption: Option<String>,
}

#[derive(Deserialize)]
struct RawSimulationInput {
    timestep: f64,
    #[serde(default = "default_seed")]
    seed: u64,
    vehicles: Vec<RawVehicleInput>,
    #[serde(default)]
    composition: Vec<CompositionEntry>,
    #[serde(default)]
    fuel_consumption: Vec<FuelConsumptionInput>,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl VehicleInput {
    /// Creates a vehicle type with default lane-changing behaviour and no fuel model.
    pub fn new(label: impl Into<String>, length: f64, model: LongitudinalModelInput) -> Self {
        Self {
            label: label.into(),
            length,
            longitudinal_model: model,
            lane_change: LaneChangeInput::default(),
            fuel_consumption: None,
        }
    }

    pub fn with_lane_change(mut self, lane_change: LaneChangeInput) -> Self {
        self.lane_change = lane_change;
        self
    }

    pub fn with_fuel_consumption(mut self, label: impl Into<String>) -> Self {
        self.fuel_consumption = Some(label.into());
        self
    }

    /// Checks the vehicle type's parameters, appending any problems to `errors`.
    pub(crate) fn validate(&self, errors: &mut Vec<ConfigError>) {
        let mut check = ParamCheck::new(&self.label, errors);
        check.positive("length", self.length);
        self.longitudinal_model.validate(&mut check);
        check_lane_change(&mut check, &self.lane_change);
    }
}

impl CompositionEntry {
    pub fn new(label: impl Into<String>, fraction: f64) -> Self {
        Self {
            label: label.into(),
            fraction,
            relative_randomization_v0: 0.0,
        }
    }

    pub fn with_randomization(mut self, relative_randomization_v0: f64) -> Self {
        self.relative_randomization_v0 = relative_randomization_v0;
        self
    }
}

impl SimulationInput {
    /// Creates an empty configuration with the given timestep.
    pub fn new(timestep: f64) -> Self {
        Self {
            timestep,
            seed: DEFAULT_SEED,
            vehicles: vec![],
            composition: vec![],
            fuel_consumption: vec![],
            rejected: vec![],
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_vehicle(mut self, vehicle: VehicleInput) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn with_entry(mut self, entry: CompositionEntry) -> Self {
        self.composition.push(entry);
        self
    }

    pub fn with_fuel_consumption(mut self, input: FuelConsumptionInput) -> Self {
        self.fuel_consumption.push(input);
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// Only malformed JSON fails here. Vehicle types with an unknown model identifier
    /// or a malformed model record are kept aside and reported by validation, together
    /// with every other problem of the configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigErrors> {
        let raw: RawSimulationInput = serde_json::from_str(json).map_err(ConfigError::from)?;
        Ok(Self::from_raw(raw))
    }

    /// Parses a configuration from a JSON reader.
    pub fn from_json_reader(reader: impl Read) -> Result<Self, ConfigErrors> {
        let raw: RawSimulationInput = serde_json::from_reader(reader).map_err(ConfigError::from)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSimulationInput) -> Self {
        let mut vehicles = Vec::with_capacity(raw.vehicles.len());
        let mut rejected = vec![];
        for vehicle in raw.vehicles {
            match LongitudinalModelInput::from_value(&vehicle.label, vehicle.longitudinal_model.clone()) {
                Ok(model) => vehicles.push(VehicleInput {
                    label: vehicle.label,
                    length: vehicle.length,
                    longitudinal_model: model,
                    lane_change: vehicle.lane_change,
                    fuel_consumption: vehicle.fuel_consumption,
                }),
                Err(_) => rejected.push(vehicle),
            }
        }
        Self {
            timestep: raw.timestep,
            seed: raw.seed,
            vehicles,
            composition: raw.composition,
            fuel_consumption: raw.fuel_consumption,
            rejected,
        }
    }

    /// Whether every vehicle type read from a file has a valid model record.
    pub fn is_resolved(&self) -> bool {
        self.rejected.is_empty()
    }

    /// The labels of all vehicle types, including those whose model record was rejected.
    pub(crate) fn vehicle_labels(&self) -> impl Iterator<Item = &str> {
        self.vehicles
            .iter()
            .map(|v| v.label.as_str())
            .chain(self.rejected.iter().map(|v| v.label.as_str()))
    }

    /// Checks the timestep and every vehicle type, returning all problems found.
    pub(crate) fn validate(&self, consumption: &ConsumptionModels) -> Vec<ConfigError> {
        let mut errors = vec![];
        if !(self.timestep > 0.0 && self.timestep.is_finite()) {
            errors.push(ConfigError::InvalidTimestep {
                timestep: self.timestep,
            });
        }
        for label in self.vehicle_labels().duplicates() {
            errors.push(ConfigError::DuplicateVehicleType {
                label: label.to_owned(),
            });
        }
        for label in self.fuel_consumption.iter().map(|f| &f.label).duplicates() {
            errors.push(ConfigError::DuplicateFuelModel {
                label: label.clone(),
            });
        }

        for vehicle in &self.vehicles {
            vehicle.validate(&mut errors);
            check_fuel_label(&vehicle.label, &vehicle.fuel_consumption, consumption, &mut errors);
        }
        for vehicle in &self.rejected {
            vehicle.validate(&mut errors);
            check_fuel_label(&vehicle.label, &vehicle.fuel_consumption, consumption, &mut errors);
        }
        for fuel in &self.fuel_consumption {
            fuel.validate(&mut errors);
        }
        errors
    }
}

impl RawVehicleInput {
    /// Reports why the model record was rejected, and checks the remaining parameters.
    fn validate(&self, errors: &mut Vec<ConfigError>) {
        if let Err(err) = LongitudinalModelInput::from_value(&self.label, self.longitudinal_model.clone()) {
            errors.push(err);
        }
        let mut check = ParamCheck::new(&self.label, errors);
        check.positive("length", self.length);
        check_lane_change(&mut check, &self.lane_change);
    }
}

fn check_lane_change(check: &mut ParamCheck, lc: &LaneChangeInput) {
    check
        .non_negative("politeness", lc.politeness)
        .non_negative("threshold_acc", lc.threshold_acc)
        .finite("bias_right", lc.bias_right)
        .positive("safe_deceleration", lc.safe_deceleration)
        .non_negative("min_gap", lc.min_gap);
}

fn check_fuel_label(
    label: &str,
    fuel: &Option<String>,
    consumption: &ConsumptionModels,
    errors: &mut Vec<ConfigError>,
) {
    if let Some(fuel) = fuel {
        if !consumption.contains(fuel) {
            errors.push(ConfigError::UnknownFuelModel {
                label: label.to_owned(),
                fuel: fuel.clone(),
            });
        }
    }
}

/// Collects invalid parameter values of a single vehicle type.
pub(crate) struct ParamCheck<'a> {
    label: &'a str,
    errors: &'a mut Vec<ConfigError>,
}

impl<'a> ParamCheck<'a> {
    pub fn new(label: &'a str, errors: &'a mut Vec<ConfigError>) -> Self {
        Self { label, errors }
    }

    pub fn positive(&mut self, name: &'static str, value: f64) -> &mut Self {
        self.check(name, value, value > 0.0 && value.is_finite())
    }

    pub fn non_negative(&mut self, name: &'static str, value: f64) -> &mut Self {
        self.check(name, value, value >= 0.0 && value.is_finite())
    }

    pub fn probability(&mut self, name: &'static str, value: f64) -> &mut Self {
        self.check(name, value, Interval::new(0.0, 1.0).contains(value))
    }

    pub fn finite(&mut self, name: &'static str, value: f64) -> &mut Self {
        self.check(name, value, value.is_finite())
    }

    fn check(&mut self, name: &'static str, value: f64, ok: bool) -> &mut Self {
        if !ok {
            self.errors.push(ConfigError::InvalidParameter {
                label: self.label.to_owned(),
                name,
                value,
            });
        }
        self
    }
}
