//! Configuration errors.
//!
//! Every problem found while setting up a vehicle population is a [ConfigError].
//! Setup never stops at the first problem: all of them are collected into a
//! single [ConfigErrors] value so the caller sees the whole picture at once.

use std::fmt;

use itertools::Itertools;
use thiserror::Error;

/// A single problem with the vehicle configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("vehicle type '{label}': unknown longitudinal model '{model}'")]
    UnknownModel { label: String, model: String },

    #[error("vehicle type '{label}': invalid longitudinal model record: {source}")]
    InvalidModelRecord {
        label: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("composition references vehicle type '{label}' which is not defined")]
    MissingVehicleType { label: String },

    #[error("vehicle type '{label}' is defined more than once")]
    DuplicateVehicleType { label: String },

    #[error("vehicle type '{label}' appears more than once in the composition")]
    DuplicateComposition { label: String },

    #[error("composition entry '{label}': fraction {fraction} must be finite and non-negative")]
    InvalidFraction { label: String, fraction: f64 },

    #[error("composition entry '{label}': relative desired speed randomization {value} must lie in [0, 1)")]
    InvalidRandomization { label: String, value: f64 },

    #[error("the traffic composition is empty")]
    EmptyComposition,

    #[error("composition fractions sum to {sum}, expected a positive total")]
    ZeroTotalFraction { sum: f64 },

    #[error("vehicle type '{label}': parameter '{name}' has invalid value {value}")]
    InvalidParameter {
        label: String,
        name: &'static str,
        value: f64,
    },

    #[error("vehicle type '{label}': fuel consumption model '{fuel}' is not defined")]
    UnknownFuelModel { label: String, fuel: String },

    #[error("fuel consumption model '{label}' is defined more than once")]
    DuplicateFuelModel { label: String },

    #[error("simulation timestep {timestep} must be positive and finite")]
    InvalidTimestep { timestep: f64 },

    #[error("cannot create vehicle: type '{label}' is not configured")]
    UnknownLabel { label: String },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The error returned when a string names no known longitudinal model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown longitudinal model '{0}'")]
pub struct ParseModelKindError(pub String);

/// All the problems found while validating a configuration. Never empty.
#[derive(Debug)]
pub struct ConfigErrors(Vec<ConfigError>);

impl ConfigErrors {
    /// Wraps the collected errors, or returns `None` if there are none.
    pub(crate) fn from_vec(errors: Vec<ConfigError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// The individual errors, in the order they were found.
    pub fn errors(&self) -> &[ConfigError] {
        &self.0
    }

    /// The number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, as there is at least one error.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ConfigError> {
        self.0
    }
}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} configuration error(s): {}",
            self.0.len(),
            self.0.iter().join("; ")
        )
    }
}

impl std::error::Error for ConfigErrors {}
