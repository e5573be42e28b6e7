//! Knapsack demo for the branch-and-cut solver.
//!
//! Run with: RUST_LOG=info cargo run --release -p branch-cut --example knapsack

use std::time::Instant;

use branch_cut::{solve_mip, MipSettings, MipSolution};
use lp_core::{ObjSense, ProblemData, VarType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sprs::{CsMat, TriMat};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Branch-and-Cut Knapsack Demo ===\n");

    small_knapsack();
    random_knapsack(30, 7);
}

/// max 3x0 + 2x1 + 4x2  s.t.  2x0 + x1 + 3x2 <= 4, x binary
fn small_knapsack() {
    println!("--- Small knapsack ---");
    println!("max 3x0 + 2x1 + 4x2 s.t. 2x0 + x1 + 3x2 <= 4, x binary");

    // Written as -2x0 - x1 - 3x2 >= -4
    let a = CsMat::new_csc((1, 3), vec![0, 1, 2, 3], vec![0, 0, 0], vec![-2.0, -1.0, -3.0]);
    let prob = ProblemData {
        A: a,
        b: vec![-4.0],
        c: vec![3.0, 2.0, 4.0],
        sense: ObjSense::Maximize,
        var_bounds: None,
        integrality: Some(vec![VarType::Binary; 3]),
    };

    run_solve(&prob, &MipSettings::default());
}

/// Random multi-dimensional knapsack with `n` items and 3 capacity rows.
fn random_knapsack(n: usize, seed: u64) {
    println!("--- Random knapsack ({} items, seed {}) ---", n, seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let m = 3;

    let mut tri = TriMat::new((m, n));
    let mut b = Vec::with_capacity(m);
    for i in 0..m {
        let mut total = 0.0;
        for j in 0..n {
            let w = rng.gen_range(1..=20) as f64;
            tri.add_triplet(i, j, -w);
            total += w;
        }
        b.push(-(total / 2.0).floor());
    }
    let c: Vec<f64> = (0..n).map(|_| rng.gen_range(5..=40) as f64).collect();

    let prob = ProblemData {
        A: tri.to_csc(),
        b,
        c,
        sense: ObjSense::Maximize,
        var_bounds: None,
        integrality: Some(vec![VarType::Binary; n]),
    };

    let settings = MipSettings::verbose().with_time_limit(30.0).with_cglp(16);
    let settings = MipSettings {
        log_freq: 50,
        ..settings
    };
    run_solve(&prob, &settings);
}

fn run_solve(prob: &ProblemData, settings: &MipSettings) {
    let start = Instant::now();
    match solve_mip(prob, settings) {
        Ok(sol) => report(&sol, start.elapsed().as_secs_f64()),
        Err(e) => println!("Error: {}", e),
    }
    println!();
}

fn report(sol: &MipSolution, secs: f64) {
    println!("Status:     {}", sol.status);
    println!("Objective:  {:.4}", sol.obj_val);
    println!("Bound:      {:.4}", sol.bound);
    println!("Gap:        {:.4}%", sol.gap * 100.0);
    println!("Nodes:      {}", sol.nodes_explored);
    println!(
        "Cuts:       {} added ({} Gomory, {} CGLP generated)",
        sol.cuts_added, sol.stats.gomory_cuts, sol.stats.cglp_cuts
    );
    println!("Time:       {:.3}s", secs);
    if let Some(x) = &sol.x {
        let chosen: Vec<usize> = (0..x.len()).filter(|&j| x[j] > 0.5).collect();
        println!("Items:      {:?}", chosen);
    }
}
