use criterion::{criterion_group, criterion_main, Criterion};
use fuelmix_lib::{
    evaluate_leg, load_regulatory_data, optimize_voyage, FuelBlend, RegulatoryData, Scenario,
    ScenarioParams, SolverStrategy, TripKind, TripLeg,
};
use once_cell::sync::Lazy;
use std::hint::black_box;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

static DATA: Lazy<RegulatoryData> = Lazy::new(|| {
    load_regulatory_data(&fixtures_dir().join("regulatory")).expect("fixture data loads")
});
static SCENARIO: Lazy<Scenario> = Lazy::new(|| {
    Scenario::from_path(&fixtures_dir().join("scenarios/three_legs.json"))
        .expect("fixture scenario loads")
});
static LEG: Lazy<TripLeg> = Lazy::new(|| {
    TripLeg::new(TripKind::IntraEu, 3.0e8)
        .with_fixed("MDO", 1_500.0)
        .with_candidates(["VLSFO", "BIO-DIESEL"])
});
static BLEND: Lazy<FuelBlend> = Lazy::new(|| {
    FuelBlend::from_tonnages([("MDO", 3_000.0), ("VLSFO", 2_000.0), ("BIO-DIESEL", 1_000.0)])
        .expect("valid blend")
});

fn benchmark_optimizer(c: &mut Criterion) {
    let data = &*DATA;
    let params = ScenarioParams::new(2030, 100.0);

    c.bench_function("evaluate_leg_intra_eu", |b| {
        let leg = &*LEG;
        let blend = &*BLEND;
        b.iter(|| {
            let result = evaluate_leg(data, leg, blend, &params).expect("leg evaluates");
            black_box(result.breakdown.total_cost)
        });
    });

    let mut group = c.benchmark_group("optimize_three_legs");
    group.sample_size(10);
    for strategy in [
        SolverStrategy::DifferentialEvolution,
        SolverStrategy::ProjectedGradient,
    ] {
        let scenario = &*SCENARIO;
        let config = scenario.optimizer.clone().with_strategy(strategy);
        let legs = scenario.trip_legs();
        group.bench_function(strategy.as_str(), |b| {
            b.iter(|| {
                let result = optimize_voyage(data, &legs, &scenario.params, &config)
                    .expect("voyage optimises");
                black_box(result.objective)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_optimizer);
criterion_main!(benches);
