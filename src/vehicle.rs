pub use equilibrium::{DiagramPoint, EquilibriumProperties};
pub use lane_change::{AccChange, Direction, LaneChangeModel};
pub use longitudinal::{
    Acc, Gipps, Idm, Kkw, Krauss, LocalTraffic, LongitudinalModel, ModelKind, Nsm, OvmFvdm,
    ReactionDelay,
};

use crate::consumption::FuelConsumption;
use crate::VehicleId;
use rand::Rng;
use std::sync::Arc;

mod equilibrium;
mod lane_change;
mod longitudinal;

/// A simulated vehicle.
///
/// Every vehicle owns its car-following and lane-changing model instances. Only the
/// immutable fuel consumption model and equilibrium properties are shared with the
/// other vehicles of its type.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID
    id: VehicleId,
    /// The label of the vehicle type.
    label: String,
    /// The vehicle's length in m.
    length: f64,
    /// The car-following model
    longitudinal: LongitudinalModel,
    /// The lane-changing model
    lane_change: LaneChangeModel,
    /// The fuel consumption model, if the vehicle type has one.
    fuel: Option<Arc<dyn FuelConsumption>>,
    /// The equilibrium properties of the vehicle type.
    equilibrium: Arc<EquilibriumProperties>,
}

impl Vehicle {
    /// Creates a new vehicle.
    pub(crate) fn new(
        id: VehicleId,
        label: &str,
        length: f64,
        longitudinal: LongitudinalModel,
        lane_change: LaneChangeModel,
        fuel: Option<Arc<dyn FuelConsumption>>,
        equilibrium: Arc<EquilibriumProperties>,
    ) -> Self {
        Self {
            id,
            label: label.to_owned(),
            length,
            longitudinal,
            lane_change,
            fuel,
            equilibrium,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The label of the vehicle's type.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The vehicle's length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn longitudinal_model(&self) -> &LongitudinalModel {
        &self.longitudinal
    }

    pub fn longitudinal_model_mut(&mut self) -> &mut LongitudinalModel {
        &mut self.longitudinal
    }

    pub fn lane_change_model(&self) -> &LaneChangeModel {
        &self.lane_change
    }

    pub fn fuel_consumption(&self) -> Option<&dyn FuelConsumption> {
        self.fuel.as_deref()
    }

    /// The equilibrium properties of the vehicle's type.
    pub fn equilibrium(&self) -> &EquilibriumProperties {
        &self.equilibrium
    }

    /// The vehicle's desired speed in m/s, after randomization.
    pub fn desired_speed(&self) -> f64 {
        self.longitudinal.desired_speed()
    }

    /// The driver's reaction time in s.
    pub fn reaction_time(&self) -> f64 {
        self.longitudinal.reaction_time()
    }

    /// Computes the vehicle's acceleration in m/s<sup>2</sup>.
    pub fn acc<R: Rng + ?Sized>(&mut self, traffic: &LocalTraffic, rng: &mut R) -> f64 {
        self.longitudinal.acc(traffic, rng)
    }

    /// The fuel flow in l/s, or `None` if the vehicle has no fuel consumption model.
    pub fn fuel_flow(&self, vel: f64, acc: f64) -> Option<f64> {
        self.fuel
            .as_ref()
            .map(|model| model.fuel_flow_liter_per_s(vel, acc))
    }
}
