//! Vehicle prototypes: the immutable per-type blueprints vehicles are created from.
//!
//! Prototypes are built in two phases. The composition entries are first resolved
//! against the configured vehicle types, keeping their raw weights, then the
//! weights are normalized in one pass and only then are the prototypes constructed.
//! No prototype ever exists with an unnormalized fraction.

use crate::error::{ConfigError, ConfigErrors};
use crate::input::{CompositionEntry, SimulationInput, VehicleInput};
use crate::vehicle::{EquilibriumProperties, LongitudinalModel, ModelKind};
use itertools::Itertools;
use log::{debug, warn};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// An immutable blueprint of a vehicle type.
#[derive(Clone, Debug)]
pub struct VehiclePrototype {
    /// The normalized population share.
    fraction: f64,
    /// The vehicle type's configuration.
    input: VehicleInput,
    /// The relative randomization of the desired speed.
    relative_randomization_v0: f64,
    /// The car-following model as configured, before any randomization.
    template: LongitudinalModel,
    /// The equilibrium properties of `template`.
    equilibrium: Arc<EquilibriumProperties>,
}

impl VehiclePrototype {
    /// The label of the vehicle type.
    pub fn label(&self) -> &str {
        &self.input.label
    }

    /// The normalized population share, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// The vehicle length in m.
    pub fn length(&self) -> f64 {
        self.input.length
    }

    pub fn vehicle_input(&self) -> &VehicleInput {
        &self.input
    }

    pub fn relative_randomization_v0(&self) -> f64 {
        self.relative_randomization_v0
    }

    /// The car-following model family.
    pub fn model_kind(&self) -> ModelKind {
        self.template.kind()
    }

    /// The car-following model instance the equilibrium properties were computed for.
    ///
    /// Vehicles never share this instance; each one gets a freshly built model.
    pub fn template(&self) -> &LongitudinalModel {
        &self.template
    }

    pub fn equilibrium(&self) -> &EquilibriumProperties {
        &self.equilibrium
    }

    pub(crate) fn shared_equilibrium(&self) -> Arc<EquilibriumProperties> {
        self.equilibrium.clone()
    }

    /// Whether drivers of this type have a nonzero reaction time.
    pub fn has_reaction_time(&self) -> bool {
        self.template.reaction_time() > 0.0
    }
}

/// Scales raw weights so that they sum to 1.
///
/// # Errors
/// Fails with [ConfigError::ZeroTotalFraction] unless the weights have a positive, finite sum.
pub fn normalize(weights: &[f64]) -> Result<Vec<f64>, ConfigError> {
    let sum: f64 = weights.iter().sum();
    if !(sum > 0.0 && sum.is_finite()) {
        return Err(ConfigError::ZeroTotalFraction { sum });
    }
    Ok(weights.iter().map(|w| w / sum).collect())
}

/// Builds the prototypes of every composition entry, in composition order.
///
/// `errors` holds the problems already found by validating the vehicle types. The
/// composition is checked in full regardless; models are only built if no problem
/// was found at all.
pub(crate) fn build_prototypes(
    input: &SimulationInput,
    mut errors: Vec<ConfigError>,
) -> Result<Vec<VehiclePrototype>, ConfigErrors> {
    let resolved = resolve(input, &mut errors);

    let total: f64 = input
        .composition
        .iter()
        .map(|entry| entry.fraction)
        .filter(|fraction| *fraction >= 0.0 && fraction.is_finite())
        .sum();
    if !input.composition.is_empty() && !(total > 0.0 && total.is_finite()) {
        errors.push(ConfigError::ZeroTotalFraction { sum: total });
    }
    if let Some(errors) = ConfigErrors::from_vec(errors) {
        return Err(errors);
    }

    let weights: Vec<f64> = resolved.iter().map(|(entry, _)| entry.fraction).collect();
    let fractions = normalize(&weights)?;

    let prototypes = resolved
        .into_iter()
        .zip(fractions)
        .map(|((entry, vehicle), fraction)| {
            let template =
                LongitudinalModel::build(&vehicle.longitudinal_model, vehicle.length, input.timestep);
            let equilibrium = EquilibriumProperties::new(vehicle.length, &template);
            debug!(
                "Prototype '{}': model {}, fraction {:.4}, v0 randomization {}",
                vehicle.label,
                template.kind(),
                fraction,
                entry.relative_randomization_v0
            );
            VehiclePrototype {
                fraction,
                input: vehicle.clone(),
                relative_randomization_v0: entry.relative_randomization_v0,
                template,
                equilibrium: Arc::new(equilibrium),
            }
        })
        .collect();
    Ok(prototypes)
}

/// Pairs every composition entry with its vehicle type, checking the entries.
fn resolve<'a>(
    input: &'a SimulationInput,
    errors: &mut Vec<ConfigError>,
) -> Vec<(&'a CompositionEntry, &'a VehicleInput)> {
    if input.composition.is_empty() {
        errors.push(ConfigError::EmptyComposition);
    }

    let types: HashMap<&str, &VehicleInput> = input
        .vehicles
        .iter()
        .map(|vehicle| (vehicle.label.as_str(), vehicle))
        .collect();
    // Types whose model record was rejected are already reported
    let known: HashSet<&str> = input.vehicle_labels().collect();

    for label in input.composition.iter().map(|e| &e.label).duplicates() {
        errors.push(ConfigError::DuplicateComposition {
            label: label.clone(),
        });
    }

    let mut resolved = Vec::with_capacity(input.composition.len());
    for entry in &input.composition {
        if !(entry.fraction >= 0.0 && entry.fraction.is_finite()) {
            errors.push(ConfigError::InvalidFraction {
                label: entry.label.clone(),
                fraction: entry.fraction,
            });
        }
        if !(0.0..1.0).contains(&entry.relative_randomization_v0) {
            errors.push(ConfigError::InvalidRandomization {
                label: entry.label.clone(),
                value: entry.relative_randomization_v0,
            });
        }
        match types.get(entry.label.as_str()) {
            Some(vehicle) => resolved.push((entry, *vehicle)),
            None if known.contains(entry.label.as_str()) => {}
            None => errors.push(ConfigError::MissingVehicleType {
                label: entry.label.clone(),
            }),
        }
    }
    resolved
}

/// Finds the index of the prototype selected by `draw`, a number in `[0, 1)`.
///
/// Returns the first prototype whose cumulative fraction reaches the draw. Prototypes
/// with a zero fraction are never selected. Should rounding leave the total short of
/// the draw, the last selectable prototype is returned. `None` only if no prototype
/// has a positive fraction.
pub fn select_index(prototypes: &[VehiclePrototype], draw: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    let mut last = None;
    for (idx, prototype) in prototypes.iter().enumerate() {
        if prototype.fraction <= 0.0 {
            continue;
        }
        cumulative += prototype.fraction;
        if cumulative >= draw {
            return Some(idx);
        }
        last = Some(idx);
    }
    if let Some(idx) = last {
        warn!(
            "Cumulative fraction {} fell short of draw {}, using '{}'",
            cumulative,
            draw,
            prototypes[idx].label()
        );
    }
    last
}

/// Selects the prototype for a given draw in `[0, 1)`.
pub fn select(prototypes: &[VehiclePrototype], draw: f64) -> Option<&VehiclePrototype> {
    select_index(prototypes, draw).map(|idx| &prototypes[idx])
}

/// Draws a prototype at random, weighted by fraction.
pub fn sample<'a, R: Rng + ?Sized>(
    prototypes: &'a [VehiclePrototype],
    rng: &mut R,
) -> Option<&'a VehiclePrototype> {
    select(prototypes, rng.gen::<f64>())
}
