use sir_ode::{
    assert_almost_eq, CompartmentState, Parameters, ScenarioRunner, SweepReport, TimeGrid,
    Trajectory, Transmission,
};

// Allowed undershoot below zero and slack on monotonicity; of the order of the integrator's
// absolute tolerance.
const EPSILON: f64 = 1e-6;

fn reference_initial() -> CompartmentState {
    CompartmentState::from_population(1000.0, 1.0, 0.0).unwrap()
}

fn reference_grid() -> TimeGrid {
    TimeGrid::linspace(0.0, 160.0, 160).unwrap()
}

fn parameters(beta: f64, gamma: f64) -> Parameters {
    Parameters::new(beta, gamma).unwrap()
}

fn reference_sweep(transmission: Transmission) -> SweepReport {
    ScenarioRunner::new(reference_initial(), reference_grid())
        .with_transmission(transmission)
        .with_scenario("slow", parameters(0.3, 0.1))
        .with_scenario("fast", parameters(0.5, 0.2))
        .run()
        .unwrap()
}

fn trajectory<'a>(report: &'a SweepReport, label: &str) -> &'a Trajectory {
    &report.result(label).unwrap().trajectory
}

fn is_non_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[1] <= pair[0] + EPSILON)
}

fn is_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[1] >= pair[0] - EPSILON)
}

#[test]
fn population_is_conserved() {
    for transmission in [Transmission::MassAction, Transmission::FrequencyDependent] {
        let report = reference_sweep(transmission);
        for result in report.results() {
            assert!(
                result.trajectory.max_population_drift() < 1e-6,
                "{} ({transmission:?}) drifted by {}",
                result.label,
                result.trajectory.max_population_drift()
            );
        }
    }
}

#[test]
fn compartments_stay_non_negative() {
    for transmission in [Transmission::MassAction, Transmission::FrequencyDependent] {
        let report = reference_sweep(transmission);
        for result in report.results() {
            for state in result.trajectory.states() {
                assert!(state.susceptible >= -EPSILON, "{state:?}");
                assert!(state.infected >= -EPSILON, "{state:?}");
                assert!(state.recovered >= -EPSILON, "{state:?}");
            }
        }
    }
}

#[test]
fn no_transmission_keeps_susceptibles_constant() {
    let initial = CompartmentState::new(990.0, 10.0, 0.0).unwrap();
    let report = ScenarioRunner::new(initial, reference_grid())
        .with_scenario("no transmission", parameters(0.0, 0.1))
        .run()
        .unwrap();
    let trajectory = trajectory(&report, "no transmission");
    assert!(trajectory.susceptible().iter().all(|&s| s == 990.0));
    // Infections simply decay exponentially.
    for (t, state) in trajectory.iter() {
        let expected = 10.0 * (-0.1 * t).exp();
        assert!((state.infected - expected).abs() <= 1e-6 * expected + 1e-6);
    }
}

#[test]
fn no_recovery_keeps_recovered_constant() {
    let initial = CompartmentState::new(900.0, 5.0, 95.0).unwrap();
    let report = ScenarioRunner::new(initial, TimeGrid::linspace(0.0, 1.0, 101).unwrap())
        .with_scenario("no recovery", parameters(0.01, 0.0))
        .run()
        .unwrap();
    let trajectory = trajectory(&report, "no recovery");
    assert!(trajectory.recovered().iter().all(|&r| r == 95.0));
    assert!(is_non_increasing(&trajectory.susceptible()));
    assert!(is_non_decreasing(&trajectory.infected()));
}

#[test]
fn trajectory_starts_at_initial_state() {
    let initial = CompartmentState::new(812.5, 37.25, 150.25).unwrap();
    let report = ScenarioRunner::new(initial, reference_grid())
        .with_scenario("a", parameters(0.3, 0.1))
        .with_scenario("b", parameters(0.001, 0.05))
        .run()
        .unwrap();
    for result in report.results() {
        assert_eq!(*result.trajectory.initial(), initial);
        assert_eq!(result.trajectory.times()[0], 0.0);
    }
}

#[test]
fn scenarios_are_independent_of_order() {
    let forward = ScenarioRunner::new(reference_initial(), reference_grid())
        .with_scenario("slow", parameters(0.3, 0.1))
        .with_scenario("fast", parameters(0.5, 0.2))
        .run()
        .unwrap();
    let backward = ScenarioRunner::new(reference_initial(), reference_grid())
        .with_scenario("fast", parameters(0.5, 0.2))
        .with_scenario("slow", parameters(0.3, 0.1))
        .run()
        .unwrap();
    assert_eq!(forward.labels(), vec!["slow", "fast"]);
    assert_eq!(backward.labels(), vec!["fast", "slow"]);
    for label in ["slow", "fast"] {
        assert_eq!(trajectory(&forward, label), trajectory(&backward, label));
    }

    let alone = ScenarioRunner::new(reference_initial(), reference_grid())
        .with_scenario("fast", parameters(0.5, 0.2))
        .run()
        .unwrap();
    assert_eq!(trajectory(&alone, "fast"), trajectory(&forward, "fast"));
}

#[test]
fn reference_outbreak_rises_and_burns_out() {
    let report = reference_sweep(Transmission::MassAction);
    let trajectory = trajectory(&report, "slow");
    assert_eq!(trajectory.len(), 160);
    assert_eq!(trajectory.times()[159], 160.0);

    let peak = trajectory.peak_infected();
    assert!(peak.index > 0);
    assert!(peak.infected > 1.0);
    assert!(peak.infected < 1000.0);

    let infected = trajectory.infected();
    assert!(is_non_increasing(&infected[peak.index..]));
    assert!(trajectory.last().infected < 1e-2);

    assert!(is_non_increasing(&trajectory.susceptible()));
    assert!(is_non_decreasing(&trajectory.recovered()));
    assert_almost_eq!(trajectory.last().total(), 1000.0, 1e-6);
}

#[test]
fn faster_scenario_peaks_earlier() {
    // Under mass action both outbreaks peak within the first tenth of a day, so a fine grid is
    // needed to tell them apart.
    let grid = TimeGrid::linspace(0.0, 1.0, 10001).unwrap();
    let report = ScenarioRunner::new(reference_initial(), grid)
        .with_scenario("slow", parameters(0.3, 0.1))
        .with_scenario("fast", parameters(0.5, 0.2))
        .run()
        .unwrap();
    let slow = trajectory(&report, "slow").peak_infected();
    let fast = trajectory(&report, "fast").peak_infected();
    assert!(slow.index > 0 && fast.index > 0);
    assert!(slow.index < 10000 && fast.index < 10000);
    assert!(
        fast.time < slow.time,
        "fast peaked at {} and slow at {}",
        fast.time,
        slow.time
    );
}

#[test]
fn faster_scenario_peaks_earlier_with_frequency_dependent_transmission() {
    let report = reference_sweep(Transmission::FrequencyDependent);
    let slow = trajectory(&report, "slow").peak_infected();
    let fast = trajectory(&report, "fast").peak_infected();
    assert!(slow.index > 0 && slow.index < 159);
    assert!(fast.index > 0 && fast.index < 159);
    assert!(fast.time < slow.time);
    assert!(fast.infected < 1000.0 && slow.infected < 1000.0);
}
