pub use consumption::{ConsumptionModels, FuelConsumption, FuelConsumptionInput, PhysicsConsumption};
pub use error::{ConfigError, ConfigErrors, ParseModelKindError};
pub use generator::VehicleGenerator;
pub use input::{
    AccParams, CompositionEntry, GippsParams, IdmParams, KkwParams, KraussParams, LaneChangeInput,
    LongitudinalModelInput, NsmParams, OvmFvdmParams, SimulationInput, VehicleInput,
};
pub use prototype::{normalize, VehiclePrototype};
pub use util::Interval;
pub use vehicle::{
    AccChange, DiagramPoint, Direction, EquilibriumProperties, LaneChangeModel, LocalTraffic,
    LongitudinalModel, ModelKind, ReactionDelay, Vehicle,
};

mod consumption;
mod error;
mod generator;
mod input;
pub mod math;
pub mod prototype;
mod util;
pub mod vehicle;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique ID of a [Vehicle], assigned in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
