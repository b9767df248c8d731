use bgls::{
    circuit::{ Circuit, Operation },
    gate::Gate,
    result::int_to_bits,
    sim::Simulator,
    statevec::{ self, StateVec },
};
use itertools::Itertools;
use tracing::info;
use tracing_subscriber::EnvFilter;

const N: usize = 5;
const REPS: usize = 1000;
const SEED: u64 = 7;

fn ghz(n: usize) -> Circuit<Gate> {
    let mut circuit: Circuit<Gate> = Circuit::new();
    circuit.push(Operation::gate(Gate::H, [0]));
    (0..n - 1).for_each(|k| { circuit.push(Operation::gate(Gate::CX, [k, k + 1])); });
    circuit.push(Operation::measure(0..n, "z"));
    circuit
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let circuit = ghz(N);
    println!("{}", circuit);
    let sim
        = Simulator::new(StateVec::new(N), statevec::apply, statevec::probability)
        .with_seed(SEED);
    let results = match sim.run(&circuit, REPS) {
        Ok(res) => res,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        },
    };
    info!(repetitions = results.repetitions(), "finished sampling");

    for (k, count) in results.histogram("z").into_iter().sorted() {
        let bits: String
            = int_to_bits(k, N).into_iter()
            .map(|b| if b { '1' } else { '0' })
            .collect();
        println!("{} ({:2}): {:4}", bits, k, count);
    }
}
