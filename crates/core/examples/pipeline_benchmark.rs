//! Lightweight lex/structure/rewrite benchmark harness for local baselines.
//!
//! Run from repository root:
//! `cargo run -p frontkit_core --example pipeline_benchmark --release`

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use frontkit_core::{Discard, Grammar};

fn locate(relative: &str, env_var: &str) -> Result<PathBuf, String> {
    let mut candidates: Vec<PathBuf> = vec![
        PathBuf::from(relative),
        PathBuf::from("../..").join(relative),
    ];
    if let Ok(from_env) = std::env::var(env_var) {
        candidates.insert(0, PathBuf::from(from_env));
    }
    candidates
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| format!("unable to locate {relative}; set {env_var} to its path"))
}

fn per_iter(elapsed: Duration, iterations: usize) -> f64 {
    elapsed.as_secs_f64() * 1000.0 / iterations as f64
}

fn run_benchmark(label: &str, input: &str, grammar: &Grammar, iterations: usize) {
    let lex_start = Instant::now();
    for _ in 0..iterations {
        let _ = grammar.lex(input, label);
    }
    let lex_elapsed = lex_start.elapsed();

    let tokens = grammar.lex(input, label);
    let structure_start = Instant::now();
    for _ in 0..iterations {
        let _ = grammar.structure().parse(tokens.clone(), &mut Discard);
    }
    let structure_elapsed = structure_start.elapsed();

    let tree = grammar.structure().parse(tokens, &mut Discard);
    let rewrite_start = Instant::now();
    for _ in 0..iterations {
        let mut copy = tree.clone();
        grammar.rewrite(&mut copy, &mut Discard);
    }
    let rewrite_elapsed = rewrite_start.elapsed();

    println!("Benchmark: {label}");
    println!("  input_bytes: {}", input.len());
    println!(
        "  lex:       total={:?}, per_iter={:.3} ms",
        lex_elapsed,
        per_iter(lex_elapsed, iterations)
    );
    println!(
        "  structure: total={:?}, per_iter={:.3} ms",
        structure_elapsed,
        per_iter(structure_elapsed, iterations)
    );
    println!(
        "  rewrite:   total={:?}, per_iter={:.3} ms",
        rewrite_elapsed,
        per_iter(rewrite_elapsed, iterations)
    );
}

fn main() -> Result<(), String> {
    let grammar_path = locate("demos/calc.jsonc", "FRONTKIT_GRAMMAR")?;
    let grammar_text = fs::read_to_string(&grammar_path)
        .map_err(|e| format!("failed to read grammar '{}': {e}", grammar_path.display()))?;
    let grammar = Grammar::from_jsonc_str(&grammar_text)
        .map_err(|e| format!("invalid grammar '{}': {e}", grammar_path.display()))?;

    let iterations = std::env::var("FRONTKIT_BENCH_ITERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(500);

    let sample_path = locate("demos/sample.calc", "FRONTKIT_SAMPLE")?;
    let sample = fs::read_to_string(&sample_path)
        .map_err(|e| format!("failed to read sample '{}': {e}", sample_path.display()))?;

    run_benchmark("sample", &sample, &grammar, iterations);
    run_benchmark("sample_x200", &sample.repeat(200), &grammar, iterations / 10 + 1);

    Ok(())
}
