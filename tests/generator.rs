//! Tests that set up a vehicle population and create vehicles from it.

use assert_approx_eq::assert_approx_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use traffic_mix::{
    CompositionEntry, ConfigError, GippsParams, IdmParams, KraussParams, LocalTraffic,
    LongitudinalModelInput, ModelKind, NsmParams, SimulationInput, VehicleGenerator, VehicleInput,
};

fn idm() -> LongitudinalModelInput {
    LongitudinalModelInput::Idm(IdmParams::default())
}

fn gipps(reaction_time: f64) -> LongitudinalModelInput {
    LongitudinalModelInput::Gipps(GippsParams {
        reaction_time,
        ..Default::default()
    })
}

/// Three parts IDM cars to one part Gipps trucks.
fn three_to_one() -> SimulationInput {
    SimulationInput::new(0.2)
        .with_seed(1)
        .with_vehicle(VehicleInput::new("car", 5.0, idm()))
        .with_vehicle(VehicleInput::new("truck", 12.0, gipps(0.0)))
        .with_entry(CompositionEntry::new("car", 3.0).with_randomization(0.2))
        .with_entry(CompositionEntry::new("truck", 1.0))
}

/// Test that the normalized fractions sum to one.
#[test]
fn fractions_sum_to_one() {
    let input = SimulationInput::new(0.2)
        .with_vehicle(VehicleInput::new("a", 5.0, idm()))
        .with_vehicle(VehicleInput::new("b", 5.0, idm()))
        .with_vehicle(VehicleInput::new("c", 5.0, idm()))
        .with_entry(CompositionEntry::new("a", 0.1))
        .with_entry(CompositionEntry::new("b", 0.7))
        .with_entry(CompositionEntry::new("c", 1.3));
    let generator = VehicleGenerator::new(&input).unwrap();
    let sum: f64 = generator.prototypes().map(|p| p.fraction()).sum();
    assert_approx_eq!(sum, 1.0, 1e-9);
}

/// Test that a three-to-one composition is normalized and sampled at the right boundary.
#[test]
fn three_to_one_composition() {
    let generator = VehicleGenerator::new(&three_to_one()).unwrap();
    let fractions: Vec<_> = generator.prototypes().map(|p| p.fraction()).collect();
    assert_approx_eq!(fractions[0], 0.75);
    assert_approx_eq!(fractions[1], 0.25);

    let prototypes: Vec<_> = generator.prototypes().cloned().collect();
    let select = |draw| traffic_mix::prototype::select(&prototypes, draw).map(|p| p.label());
    assert_eq!(select(0.70), Some("car"));
    assert_eq!(select(0.80), Some("truck"));
}

/// Test that sampling frequencies converge to the configured fractions.
#[test]
fn sampling_frequencies() {
    let generator = VehicleGenerator::new(&three_to_one()).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let n = 100_000;
    let cars = (0..n)
        .filter(|_| generator.sample_prototype_with(&mut rng).label() == "car")
        .count();
    let share = cars as f64 / n as f64;
    assert!((share - 0.75).abs() < 0.01, "{}", share);
}

/// Test that every model family is paired with equilibrium properties of the same family.
#[test]
fn every_family_is_paired() {
    let mut input = SimulationInput::new(0.5);
    for kind in ModelKind::ALL {
        input = input
            .with_vehicle(VehicleInput::new(kind.name(), 6.0, LongitudinalModelInput::with_defaults(kind)))
            .with_entry(CompositionEntry::new(kind.name(), 1.0));
    }
    let generator = VehicleGenerator::new(&input).unwrap();
    assert_eq!(generator.prototypes().count(), ModelKind::ALL.len());
    for prototype in generator.prototypes() {
        assert_eq!(prototype.model_kind().name(), prototype.label());
        assert_eq!(prototype.equilibrium().kind(), prototype.model_kind());
        let vehicle = generator.create_vehicle_from(prototype);
        assert_eq!(vehicle.longitudinal_model().kind(), prototype.model_kind());
        assert_eq!(vehicle.equilibrium().kind(), prototype.model_kind());
    }
}

/// Test that an unknown model identifier is reported rather than defaulted.
#[test]
fn unknown_model_is_an_error() {
    let json = r#"{
        "timestep": 0.2,
        "vehicles": [ { "label": "car", "length": 5.0, "longitudinal_model": { "model": "PIPES" } } ],
        "composition": [ { "label": "car", "fraction": 1.0 } ]
    }"#;
    let input = SimulationInput::from_json_str(json).unwrap();
    assert!(!input.is_resolved());
    let errors = VehicleGenerator::new(&input).err().unwrap();
    assert_eq!(errors.len(), 1, "{}", errors);
    assert!(matches!(
        &errors.errors()[0],
        ConfigError::UnknownModel { model, .. } if model == "PIPES"
    ));
}

/// Test that an unknown model does not hide the other problems of a setup.
#[test]
fn unknown_model_with_other_errors() {
    let json = r#"{
        "timestep": 0.2,
        "vehicles": [
            { "label": "car", "length": 5.0, "longitudinal_model": { "model": "PIPES" } },
            { "label": "truck", "length": -3.0, "longitudinal_model": { "model": "IDM" } }
        ],
        "composition": [
            { "label": "car", "fraction": 1.0 },
            { "label": "truck", "fraction": 1.0 },
            { "label": "bus", "fraction": 1.0 }
        ]
    }"#;
    let input = SimulationInput::from_json_str(json).unwrap();
    let errors = VehicleGenerator::new(&input).err().unwrap();
    let errors = errors.errors();
    assert_eq!(errors.len(), 3, "{:?}", errors);
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::UnknownModel { label, model } if label == "car" && model == "PIPES")
    ));
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::InvalidParameter { label, name: "length", .. } if label == "truck")
    ));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::MissingVehicleType { label } if label == "bus")));
}

/// Test that a zero total fraction is reported along with invalid parameters.
#[test]
fn zero_total_with_invalid_parameters() {
    let input = SimulationInput::new(0.2)
        .with_vehicle(VehicleInput::new(
            "car",
            5.0,
            LongitudinalModelInput::Idm(IdmParams {
                a: 0.0,
                ..Default::default()
            }),
        ))
        .with_entry(CompositionEntry::new("car", 0.0));
    let errors = VehicleGenerator::new(&input).err().unwrap();
    assert_eq!(errors.len(), 2, "{}", errors);
    assert!(matches!(errors.errors()[0], ConfigError::InvalidParameter { name: "a", .. }));
    assert!(matches!(errors.errors()[1], ConfigError::ZeroTotalFraction { .. }));
}

/// Test creating vehicles by label.
#[test]
fn create_by_label() {
    let generator = VehicleGenerator::new(&three_to_one()).unwrap();
    let truck = generator.create_vehicle_by_label("truck").unwrap();
    assert_eq!(truck.label(), "truck");
    assert_eq!(truck.length(), 12.0);
    assert!(matches!(
        generator.create_vehicle_by_label("bus"),
        Err(ConfigError::UnknownLabel { label }) if label == "bus"
    ));
}

/// Test that vehicles of one prototype share no mutable state.
#[test]
fn vehicles_are_independent() {
    let generator = VehicleGenerator::new(&three_to_one()).unwrap();
    let prototype = generator.prototype("car").unwrap();
    let template_v0 = prototype.template().desired_speed();

    let mut first = generator.create_vehicle_from(prototype);
    let second = generator.create_vehicle_from(prototype);
    let second_v0 = second.desired_speed();

    first.longitudinal_model_mut().set_desired_speed(1.0);
    assert_eq!(first.desired_speed(), 1.0);
    assert_eq!(second.desired_speed(), second_v0);
    assert_eq!(prototype.template().desired_speed(), template_v0);
    assert_ne!(first.id(), second.id());
}

/// Test that reaction time histories are per vehicle.
#[test]
fn reaction_buffers_are_independent() {
    let input = SimulationInput::new(0.2)
        .with_vehicle(VehicleInput::new("truck", 12.0, gipps(0.6)))
        .with_entry(CompositionEntry::new("truck", 1.0));
    let generator = VehicleGenerator::new(&input).unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    let mut first = generator.create_vehicle_by_label("truck").unwrap();
    let second = generator.create_vehicle_by_label("truck").unwrap();
    for _ in 0..3 {
        first.acc(&LocalTraffic::following(10.0, 30.0, 10.0), &mut rng);
    }
    let len = |v: &traffic_mix::Vehicle| v.longitudinal_model().reaction_delay().map(|d| d.len());
    assert_eq!(len(&first), Some(3));
    assert_eq!(len(&second), Some(0));
}

/// Test the aggregate reaction time flag.
#[test]
fn reaction_time_flag() {
    let all_idm = SimulationInput::new(0.2)
        .with_vehicle(VehicleInput::new("car", 5.0, idm()))
        .with_entry(CompositionEntry::new("car", 1.0));
    assert!(!VehicleGenerator::new(&all_idm).unwrap().is_with_reaction_times());

    // Reaction times are opt-in, even for models supporting them
    assert!(!VehicleGenerator::new(&three_to_one()).unwrap().is_with_reaction_times());

    for model in [
        gipps(0.6),
        LongitudinalModelInput::Krauss(KraussParams {
            reaction_time: 0.4,
            ..Default::default()
        }),
        LongitudinalModelInput::Nsm(NsmParams {
            reaction_time: 1.0,
            ..Default::default()
        }),
    ] {
        let input = SimulationInput::new(0.2)
            .with_vehicle(VehicleInput::new("car", 5.0, idm()))
            .with_vehicle(VehicleInput::new("slow", 8.0, model))
            .with_entry(CompositionEntry::new("car", 1.0))
            .with_entry(CompositionEntry::new("slow", 1.0));
        assert!(VehicleGenerator::new(&input).unwrap().is_with_reaction_times());
    }
}

/// Test that a seeded generator reproduces its vehicle sequence.
#[test]
fn reproducible_from_seed() {
    let run = || {
        let generator = VehicleGenerator::new(&three_to_one()).unwrap();
        (0..200)
            .map(|_| {
                let vehicle = generator.create_vehicle();
                (vehicle.label().to_owned(), vehicle.desired_speed())
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

/// Test that desired speed randomization stays within its relative range.
#[test]
fn desired_speed_randomization() {
    let generator = VehicleGenerator::new(&three_to_one()).unwrap();
    let mut rng = StdRng::seed_from_u64(77);
    let car = generator.prototype("car").unwrap();
    let speeds: Vec<_> = (0..500)
        .map(|_| generator.create_vehicle_from_with(car, &mut rng).desired_speed())
        .collect();
    let v0 = IdmParams::default().v0;
    assert!(speeds.iter().all(|v| *v >= 0.8 * v0 - 1e-9 && *v < 1.2 * v0));
    assert!(speeds.iter().any(|v| *v < v0) && speeds.iter().any(|v| *v > v0));

    // Trucks are not randomized
    let truck = generator.prototype("truck").unwrap();
    let vehicle = generator.create_vehicle_from_with(truck, &mut rng);
    assert_eq!(vehicle.desired_speed(), GippsParams::default().v0);
}

/// Test that every configuration problem is reported at once.
#[test]
fn setup_collects_all_errors() {
    let input = SimulationInput::new(0.2)
        .with_vehicle(VehicleInput::new("car", 5.0, idm()).with_fuel_consumption("petrol"))
        .with_entry(CompositionEntry::new("car", 1.0))
        .with_entry(CompositionEntry::new("bus", 1.0));
    let errors = VehicleGenerator::new(&input).err().unwrap();
    assert_eq!(errors.len(), 2, "{}", errors);
    assert!(matches!(errors.errors()[0], ConfigError::UnknownFuelModel { .. }));
    assert!(matches!(errors.errors()[1], ConfigError::MissingVehicleType { .. }));

    let input = SimulationInput::new(0.2)
        .with_vehicle(VehicleInput::new("car", 5.0, idm()))
        .with_entry(CompositionEntry::new("car", f64::NAN))
        .with_entry(CompositionEntry::new("bus", 1.0))
        .with_entry(CompositionEntry::new("tram", 1.0));
    let errors = VehicleGenerator::new(&input).err().unwrap();
    assert_eq!(errors.len(), 3, "{}", errors);
}

/// Test loading a whole setup from JSON, including fuel consumption.
#[test]
fn from_json() {
    let json = r#"{
        "timestep": 0.25,
        "seed": 3,
        "vehicles": [
            { "label": "car", "length": 4.5, "longitudinal_model": { "model": "ACC", "coolness": 1.0 },
              "fuel_consumption": "petrol" },
            { "label": "truck", "length": 16.0, "longitudinal_model": { "model": "KRAUSS" } }
        ],
        "composition": [
            { "label": "car", "fraction": 9 },
            { "label": "truck", "fraction": 1 }
        ],
        "fuel_consumption": [ { "label": "petrol" } ]
    }"#;
    let input = SimulationInput::from_json_str(json).unwrap();
    let generator = VehicleGenerator::new(&input).unwrap();
    assert_eq!(generator.timestep(), 0.25);
    assert_approx_eq!(generator.prototype("car").unwrap().fraction(), 0.9);

    let car = generator.create_vehicle_by_label("car").unwrap();
    assert_eq!(car.longitudinal_model().kind(), ModelKind::Acc);
    assert!(car.fuel_flow(20.0, 0.0).unwrap() > 0.0);
    let truck = generator.create_vehicle_by_label("truck").unwrap();
    assert!(truck.fuel_flow(20.0, 0.0).is_none());
}
