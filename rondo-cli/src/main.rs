//! CLI for the rondo time-series storage engine.
//!
//! rondo has no on-disk store or network surface to inspect — it is an
//! in-process engine — so this CLI's job is narrower than a typical database
//! client: run the worked scenarios by hand, and measure the hot path.

use std::time::Instant;

use clap::{Parser, Subcommand};
use rondo::{BucketPolicy, RingSpec, Stack, Time};

/// rondo — Embedded round-robin time-series storage engine CLI.
#[derive(Parser)]
#[command(name = "rondo", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the engine's worked example scenarios in-process and print the
    /// resulting buckets.
    Demo {
        /// Which scenario to run.
        #[arg(value_enum, default_value = "fan-out")]
        scenario: Scenario,
    },

    /// Run a write-path microbenchmark.
    Bench {
        /// Number of samples to insert.
        #[arg(long, default_value = "1000000")]
        points: u64,

        /// Number of rings in the stack under test.
        #[arg(long, default_value = "4")]
        rings: usize,
    },
}

/// A worked scenario to demonstrate.
#[derive(Clone, clap::ValueEnum)]
enum Scenario {
    /// Multi-ring fan-out: one insert, several resolutions, finest-first
    /// query once the finest ring's horizon has passed.
    FanOut,
    /// Transaction-group smearing: a `{low, high}` envelope carried forward
    /// across a gap, the shape spec.md's motivating use case cares about.
    Smear,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Demo { scenario } => cmd_demo(&scenario),
        Commands::Bench { points, rings } => cmd_bench(points, rings),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[derive(Clone, Copy, Default)]
struct KeepLast;

impl BucketPolicy<f64> for KeepLast {
    fn update(&self, _width: Time, _current: &f64, incoming: &f64) -> f64 {
        *incoming
    }

    fn zero(&self, _width: Time, _previous: &f64, incoming: &f64) -> f64 {
        *incoming
    }
}

#[derive(Clone, Copy, Default)]
struct CarryForwardEnvelope;

impl BucketPolicy<rondo::policy::Envelope> for CarryForwardEnvelope {
    fn update(
        &self,
        _width: Time,
        current: &rondo::policy::Envelope,
        incoming: &rondo::policy::Envelope,
    ) -> rondo::policy::Envelope {
        rondo::policy::Envelope {
            low: current.low.min(incoming.low),
            high: current.high.max(incoming.high),
        }
    }

    fn zero(
        &self,
        _width: Time,
        previous: &rondo::policy::Envelope,
        _incoming: &rondo::policy::Envelope,
    ) -> rondo::policy::Envelope {
        *previous
    }
}

/// Implements `rondo demo`.
fn cmd_demo(scenario: &Scenario) -> Result<(), Box<dyn std::error::Error>> {
    match scenario {
        Scenario::FanOut => demo_fan_out(),
        Scenario::Smear => demo_smear(),
    }
    Ok(())
}

/// spec.md §8 scenario 3: widths {1, 10, 100, 1000}, capacity 100 each. A
/// single insert lands in every ring at once; as time advances the finest
/// ring's hundred-second horizon passes and only coarser rings keep
/// answering.
fn demo_fan_out() {
    println!("rondo demo: multi-ring fan-out");
    println!();

    let specs = vec![
        RingSpec::new("1s", 1, 100).expect("valid spec"),
        RingSpec::new("10s", 10, 100).expect("valid spec"),
        RingSpec::new("100s", 100, 100).expect("valid spec"),
        RingSpec::new("1000s", 1000, 100).expect("valid spec"),
    ];
    let mut stack = Stack::new("cpu.usage", specs, KeepLast).expect("valid stack");

    for t in 0..250i64 {
        stack.add_at(&(t as f64), t);
    }

    for t in [249, 100, 0] {
        match stack.query(t) {
            Some(hit) => println!(
                "query({t}) -> ring={:>6} width={:<5} value={}",
                hit.ring, hit.width, hit.payload
            ),
            None => println!("query({t}) -> none (past every ring's horizon)"),
        }
    }
}

/// spec.md §8 scenario 4: transaction-group tracking. A `{low, high}`
/// envelope over rings of widths {10, 365, 1440} (matching the motivating
/// filesystem use case's second/day/month-scale tiers), smeared forward
/// across an idle gap via carry-forward `zero`.
fn demo_smear() {
    println!("rondo demo: transaction-group smearing");
    println!();

    let specs = vec![
        RingSpec::new("fine", 10, 100).expect("valid spec"),
        RingSpec::new("daily", 365, 100).expect("valid spec"),
        RingSpec::new("monthly", 1440, 100).expect("valid spec"),
    ];
    let mut stack = Stack::new("txg", specs, CarryForwardEnvelope).expect("valid stack");

    let mut txg = 1u64;
    for t in [0i64, 5, 8, 9, 50, 4000] {
        stack.add_at(&rondo::policy::Envelope::point(txg), t);
        txg += 1;
    }

    for ring in stack.rings() {
        println!(
            "ring {:>8} (width={}): {} buckets",
            ring.name(),
            ring.width(),
            ring.length()
        );
        for i in 0..ring.length() {
            if let Some(envelope) = ring.get(i) {
                println!("  [{i}] low={} high={}", envelope.low, envelope.high);
            }
        }
    }
}

/// Implements `rondo bench`.
#[allow(clippy::cast_precision_loss)] // Benchmark stats are fine with f64 precision
fn cmd_bench(points: u64, ring_count: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("rondo write-path benchmark");
    println!("  Points: {points}");
    println!("  Rings:  {ring_count}");
    println!();

    let mut specs = Vec::with_capacity(ring_count);
    let mut width: Time = 1;
    for i in 0..ring_count {
        specs.push(RingSpec::new(format!("ring_{i}"), width, 1024)?);
        width *= 10;
    }
    let mut stack = Stack::new("bench", specs, KeepLast)?;

    println!("Inserting {points} samples across {ring_count} rings...");

    let start = Instant::now();
    for t in 0..points {
        #[allow(clippy::cast_possible_wrap)]
        stack.add_at(&(t as f64), t as Time);
    }
    let elapsed = start.elapsed();

    let total_writes = points * ring_count as u64;
    let ns_per_write = elapsed.as_nanos() as f64 / total_writes as f64;
    let writes_per_sec = total_writes as f64 / elapsed.as_secs_f64();

    println!();
    println!("Results:");
    println!("  Total ring writes: {total_writes}");
    println!("  Elapsed: {elapsed:.3?}");
    println!("  Avg latency: {ns_per_write:.1} ns/write");
    println!("  Throughput: {writes_per_sec:.0} writes/sec");

    Ok(())
}
