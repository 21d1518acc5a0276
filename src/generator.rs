use crate::consumption::ConsumptionModels;
use crate::error::{ConfigError, ConfigErrors};
use crate::input::SimulationInput;
use crate::prototype::{self, VehiclePrototype};
use crate::vehicle::{LaneChangeModel, LongitudinalModel, Vehicle};
use crate::VehicleId;
use log::{info, trace};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

/// Creates the vehicles of a simulation according to the configured traffic composition.
///
/// The generator is set up once and then shared by the simulation loop. Vehicles can be
/// created from a randomly drawn prototype, from a prototype selected by label, or from
/// a prototype passed in directly. All entry points take `&self`; the generator's own
/// random stream is locked for each draw so the draw order stays deterministic.
pub struct VehicleGenerator {
    timestep: f64,
    /// The prototypes in composition order.
    prototypes: Vec<VehiclePrototype>,
    consumption: ConsumptionModels,
    with_reaction_times: bool,
    rng: Mutex<StdRng>,
    next_id: AtomicU64,
}

impl VehicleGenerator {
    /// Sets up the vehicle prototypes.
    ///
    /// # Errors
    /// Fails with every configuration problem found.
    pub fn new(input: &SimulationInput) -> Result<Self, ConfigErrors> {
        Self::with_consumption_models(input, ConsumptionModels::new(&input.fuel_consumption))
    }

    /// Sets up the vehicle prototypes, resolving fuel consumption labels against `consumption`.
    pub fn with_consumption_models(
        input: &SimulationInput,
        consumption: ConsumptionModels,
    ) -> Result<Self, ConfigErrors> {
        let prototypes = prototype::build_prototypes(input, input.validate(&consumption))?;

        let with_reaction_times = prototypes.iter().any(VehiclePrototype::has_reaction_time);
        info!(
            "Set up {} vehicle prototypes (reaction times: {})",
            prototypes.len(),
            with_reaction_times
        );

        Ok(Self {
            timestep: input.timestep,
            prototypes,
            consumption,
            with_reaction_times,
            rng: Mutex::new(StdRng::seed_from_u64(input.seed)),
            next_id: AtomicU64::new(0),
        })
    }

    /// The simulation timestep in s.
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Iterates over the prototypes in composition order.
    pub fn prototypes(&self) -> impl Iterator<Item = &VehiclePrototype> {
        self.prototypes.iter()
    }

    /// Gets the prototype with the given label.
    pub fn prototype(&self, label: &str) -> Option<&VehiclePrototype> {
        self.prototypes.iter().find(|p| p.label() == label)
    }

    /// Whether any prototype has a nonzero reaction time.
    pub fn is_with_reaction_times(&self) -> bool {
        self.with_reaction_times
    }

    /// Draws a prototype at random, weighted by fraction.
    pub fn sample_prototype_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &VehiclePrototype {
        let idx = prototype::select_index(&self.prototypes, rng.gen::<f64>());
        // Setup guarantees a positive total fraction.
        &self.prototypes[idx.unwrap_or(self.prototypes.len() - 1)]
    }

    /// Creates a vehicle of a randomly drawn type, using the generator's own random stream.
    pub fn create_vehicle(&self) -> Vehicle {
        let mut rng = self.rng.lock();
        self.create_vehicle_with(&mut *rng)
    }

    /// Creates a vehicle of a randomly drawn type, drawing from `rng`.
    pub fn create_vehicle_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Vehicle {
        let prototype = self.sample_prototype_with(rng);
        self.instantiate(prototype, rng)
    }

    /// Creates a vehicle of the type with the given label.
    ///
    /// # Errors
    /// Fails with [ConfigError::UnknownLabel] if no such type is configured.
    pub fn create_vehicle_by_label(&self, label: &str) -> Result<Vehicle, ConfigError> {
        let prototype = self
            .prototype(label)
            .ok_or_else(|| ConfigError::UnknownLabel {
                label: label.to_owned(),
            })?;
        Ok(self.create_vehicle_from(prototype))
    }

    /// Creates a vehicle from the given prototype.
    pub fn create_vehicle_from(&self, prototype: &VehiclePrototype) -> Vehicle {
        let mut rng = self.rng.lock();
        self.instantiate(prototype, &mut *rng)
    }

    /// Creates a vehicle from the given prototype, drawing its randomization from `rng`.
    pub fn create_vehicle_from_with<R: Rng + ?Sized>(
        &self,
        prototype: &VehiclePrototype,
        rng: &mut R,
    ) -> Vehicle {
        self.instantiate(prototype, rng)
    }

    fn instantiate<R: Rng + ?Sized>(&self, prototype: &VehiclePrototype, rng: &mut R) -> Vehicle {
        let input = prototype.vehicle_input();
        let mut longitudinal =
            LongitudinalModel::build(&input.longitudinal_model, input.length, self.timestep);
        longitudinal.set_relative_randomization_v0(prototype.relative_randomization_v0(), rng);
        let lane_change = LaneChangeModel::new(&input.lane_change);
        let fuel = input
            .fuel_consumption
            .as_deref()
            .and_then(|label| self.consumption.get(label));

        let id = VehicleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        trace!(
            "Created vehicle {:?} of type '{}' with v0 = {:.2}",
            id,
            input.label,
            longitudinal.desired_speed()
        );
        Vehicle::new(
            id,
            &input.label,
            input.length,
            longitudinal,
            lane_change,
            fuel,
            prototype.shared_equilibrium(),
        )
    }
}
