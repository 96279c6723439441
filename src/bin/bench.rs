//! VM benchmark binary.
//!
//! Measures execution time for representative Intcode programs and pipeline searches.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use intcode::pipeline::amplifier::Topology;
use intcode::pipeline::search::{best_over_permutations, find_noun_verb};
use intcode::utils::log::{Level, set_max_level};
use intcode::virtual_machine::isa::Variant;
use intcode::virtual_machine::program::Program;
use intcode::virtual_machine::vm::VM;

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    /// Instructions executed by the last run (0 when not tracked).
    steps: u64,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations as u32
    }

    fn print(&self) {
        let avg = self.avg();
        let ns_per_op = avg.as_nanos();
        let ns_per_instr = Some(self.steps)
            .filter(|&n| n > 0)
            .map(|n| format!("{:>8.1}", ns_per_op as f64 / n as f64))
            .unwrap_or_else(|| "       -".to_string());
        println!(
            "  {:<30} {:>7} iters {:>10.3} us/iter {:>12} steps  {} ns/instr",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            self.steps,
            ns_per_instr,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(name: &'static str, min_duration: Duration, mut f: F) -> BenchResult
where
    F: FnMut() -> u64,
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let mut last_steps = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        last_steps = f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        steps: last_steps,
    }
}

/// Runs a fresh full-variant VM to completion and returns the number of instructions executed.
fn run_steps(program: &Program, input: &[i64]) -> u64 {
    let mut vm = VM::new(program);
    vm.run(input.iter().copied()).expect("run failed");
    vm.steps()
}

// ---------------------------------------------------------------------------
// Benchmark definitions
// ---------------------------------------------------------------------------

const QUINE: &str = "109,1,204,-1,1001,100,1,100,1008,100,16,101,1006,101,0,99";

const COMPARE_EIGHT: &str = "3,21,1008,21,8,20,1005,20,22,107,8,21,20,1006,20,31,\
1106,0,36,98,0,0,1002,21,125,20,4,20,1105,1,46,104,999,1105,1,46,1101,1000,1,20,4,\
20,1105,1,46,98,99";

const LINEAR_AMPLIFIER: &str = "3,31,3,32,1002,32,10,32,1001,31,-2,31,1007,31,0,33,\
1002,33,7,33,1,33,31,31,1,32,31,31,4,31,99,0,0,0";

const RING_AMPLIFIER: &str = "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,\
1001,54,-5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,53,1001,56,\
-1,56,1005,56,6,99,0,0,0,0,10";

/// Decrements a counter at address 12 until it reaches zero.
fn tight_loop(iterations: i64) -> Program {
    Program::new(vec![
        1001, 12, -1, 12, // counter -= 1
        1005, 12, 0, // loop while counter != 0
        104, 0, 99, 0, 0, iterations,
    ])
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let min = Duration::from_secs(2);
    // Searches report their winner at info level on every iteration.
    set_max_level(Level::Warn);

    println!("Intcode Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<30} {:>7}       {:>14} {:>12}  {:>10}",
        "benchmark", "iters", "avg time", "steps/run", "ns/instr"
    );
    println!("  {}", "-".repeat(84));

    // Pre-parse programs (parsing cost excluded from benchmark)
    let quine = Program::parse(QUINE).expect("parse");
    let compare = Program::parse(COMPARE_EIGHT).expect("parse");
    let linear = Program::parse(LINEAR_AMPLIFIER).expect("parse");
    let ring = Program::parse(RING_AMPLIFIER).expect("parse");
    let multiply = Program::parse("1102,0,0,0,99").expect("parse");

    // 1. Quine (relative mode, sparse memory)
    bench("quine", min, || run_steps(&quine, &[])).print();

    // 2. Branching on input
    bench("compare_eight", min, || run_steps(&compare, &[9])).print();

    // 3. Tight loops
    for &(name, n) in &[("tight_loop(10K)", 10_000i64), ("tight_loop(100K)", 100_000)] {
        let program = tight_loop(n);
        bench(name, min, || run_steps(&program, &[])).print();
    }

    // 4. Linear permutation search (120 pipelines)
    bench("linear_search(0..5)", min, || {
        best_over_permutations(&linear, 0..5, Topology::Linear { initial_signal: 0 })
            .expect("linear search");
        0
    })
    .print();

    // 5. Ring permutation search (120 feedback loops)
    bench("ring_search(5..=9)", min, || {
        best_over_permutations(&ring, 5..=9, Topology::Ring).expect("ring search");
        0
    })
    .print();

    // 6. Exhaustive noun/verb search (10K bounded VMs)
    bench("noun_verb(miss)", min, || {
        find_noun_verb(&multiply, 10007, Variant::Minimal).expect("noun/verb search");
        0
    })
    .print();

    println!();
}
