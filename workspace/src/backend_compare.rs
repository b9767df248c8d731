use std::time::Instant;
use bgls::{
    circuit::{ Circuit, Operation },
    density::{ self, DensityMatrix },
    error::{ BackendError, RunError },
    gate::{ random_circuit, Gate },
    result::ResultRecord,
    sim::Simulator,
    stab::{ self, Stab },
    statevec::{ self, StateVec },
};
use rand::{ rngs::StdRng, SeedableRng };
use tracing::{ info, warn };
use tracing_subscriber::EnvFilter;

const N: usize = 6;
const MOMENTS: usize = 20;
const DENSITY: f64 = 0.7;
const REPS: usize = 500;
const SEED: u64 = 10546;

fn timed<F>(label: &str, f: F) -> Result<ResultRecord, RunError<BackendError>>
where F: FnOnce() -> Result<ResultRecord, RunError<BackendError>>
{
    let t0 = Instant::now();
    let res = f();
    info!(backend = label, elapsed_ms = t0.elapsed().as_millis() as u64, "done");
    res
}

fn main() -> Result<(), RunError<BackendError>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let mut rng = StdRng::seed_from_u64(SEED);
    let gates = [
        Gate::H, Gate::S, Gate::Sdg, Gate::X, Gate::Z, Gate::CX, Gate::CZ, Gate::Swap,
    ];
    let mut circuit: Circuit<Gate>
        = random_circuit(N, MOMENTS, DENSITY, &gates, &mut rng);
    circuit.push(Operation::measure(0..N, "z"));
    println!("{}", circuit);

    let sv = Simulator::new(StateVec::new(N), statevec::apply, statevec::probability)
        .with_seed(SEED);
    let dm = Simulator::new(DensityMatrix::new(N), density::apply, density::probability)
        .with_seed(SEED);
    let st = Simulator::new(Stab::new(N), stab::apply, stab::probability)
        .with_seed(SEED);

    let res_sv = timed("statevec", || sv.run(&circuit, REPS))?;
    let res_dm = timed("density", || dm.run(&circuit, REPS))?;
    let res_st = timed("stab", || st.run(&circuit, REPS))?;
    let res_par = timed("stab (parallel)", || st.run_parallel(&circuit, REPS))?;

    for (label, res) in [("density", &res_dm), ("stab", &res_st), ("parallel", &res_par)] {
        if *res == res_sv {
            info!(backend = label, "matches statevec");
        } else {
            warn!(backend = label, "differs from statevec");
        }
    }

    let mut hist: Vec<(u64, usize)> = res_sv.histogram("z").into_iter().collect();
    hist.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then(ka.cmp(kb)));
    for (k, count) in hist.into_iter() {
        println!("{:0width$b}: {}", k, count, width = N);
    }
    Ok(())
}
