use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use sir_ode::{
    integrate, CompartmentState, IntegratorOptions, Parameters, ScenarioRunner, SirModel,
    TimeGrid, Transmission,
};

fn reference_runner(transmission: Transmission) -> ScenarioRunner {
    let initial = CompartmentState::from_population(1000.0, 1.0, 0.0).unwrap();
    let grid = TimeGrid::linspace(0.0, 160.0, 160).unwrap();
    ScenarioRunner::new(initial, grid)
        .with_transmission(transmission)
        .with_scenario("beta=0.3, gamma=0.1", Parameters::new(0.3, 0.1).unwrap())
        .with_scenario("beta=0.5, gamma=0.2", Parameters::new(0.5, 0.2).unwrap())
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario_sweep");

    let mass_action = reference_runner(Transmission::MassAction);
    group.bench_function("reference_mass_action", |bencher| {
        bencher.iter(|| black_box(mass_action.run().unwrap()));
    });

    let frequency_dependent = reference_runner(Transmission::FrequencyDependent);
    group.bench_function("reference_frequency_dependent", |bencher| {
        bencher.iter(|| black_box(frequency_dependent.run().unwrap()));
    });

    let mut many = reference_runner(Transmission::FrequencyDependent);
    for i in 0..50 {
        let beta = 0.1 + 0.01 * f64::from(i);
        many.add_scenario(format!("beta={beta:.2}"), Parameters::new(beta, 0.1).unwrap());
    }
    group.bench_function("fifty_scenarios", |bencher| {
        bencher.iter(|| black_box(many.run().unwrap()));
    });

    group.finish();

    let model = SirModel::new(
        Parameters::new(0.3, 0.1).unwrap(),
        Transmission::MassAction,
        1000.0,
    )
    .unwrap();
    let fine_grid = TimeGrid::linspace(0.0, 1.0, 10001).unwrap();
    let options = IntegratorOptions::default();
    c.bench_function("integrate_fine_grid", |bencher| {
        bencher.iter(|| {
            black_box(integrate(&model, [999.0, 1.0, 0.0], &fine_grid, &options).unwrap())
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
