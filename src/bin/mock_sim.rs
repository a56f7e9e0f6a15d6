//! Deterministic stand-in for the ns-3 2BSS scenario.
//!
//! Accepts the same `--name=value` arguments the harness passes to the real
//! simulator and prints an output transcript of the same shape, including
//! the `Throughput per STA:` marker line. Throughput is synthesized from the
//! distance, the OBSS-PD settings and the RNG run number, so sweeps against
//! the mock are fully reproducible. A few extra flags inject the failure
//! modes the harness has to survive.

use std::collections::HashMap;
use std::env;
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

#[derive(Debug, Default)]
struct MockArgs {
    distance: f64,
    threshold: Option<f64>,
    enabled: bool,
    rng_run: u64,
    fail: bool,
    hang_secs: u64,
    omit_marker: bool,
    garbage_metric: bool,
}

fn parse_args() -> MockArgs {
    let mut values: HashMap<String, String> = HashMap::new();
    let mut flags: Vec<String> = Vec::new();

    // Arguments may arrive separately or bundled into one ns-3 style
    // scenario string; split on whitespace first so both work.
    for raw in env::args().skip(1) {
        for token in raw.split_whitespace() {
            let Some(stripped) = token.strip_prefix("--") else {
                continue;
            };
            match stripped.split_once('=') {
                Some((key, value)) => {
                    values.insert(key.to_string(), value.to_string());
                }
                None => flags.push(stripped.to_string()),
            }
        }
    }

    let lookup_f64 = |keys: &[&str]| -> Option<f64> {
        keys.iter()
            .find_map(|key| values.get(*key))
            .and_then(|value| value.parse::<f64>().ok())
    };

    MockArgs {
        distance: lookup_f64(&["d3", "d2", "d1", "distance"]).unwrap_or(20.0),
        threshold: lookup_f64(&["obssPdThreshold"]),
        enabled: values
            .get("enableObssPd")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        rng_run: values
            .get("rngRun")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1),
        fail: flags.iter().any(|f| f == "fail"),
        hang_secs: values
            .get("hang-secs")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0),
        omit_marker: flags.iter().any(|f| f == "omit-marker"),
        garbage_metric: flags.iter().any(|f| f == "garbage-metric"),
    }
}

/// Synthetic per-STA throughput in Mbps: free-space-ish decay over distance,
/// a spatial-reuse bonus that grows with a more aggressive (higher) OBSS-PD
/// threshold, and per-run Gaussian noise.
fn synth_throughput(args: &MockArgs) -> f64 {
    let mut rng = ChaCha8Rng::seed_from_u64(args.rng_run);
    let noise = Normal::new(0.0, 0.8).expect("valid noise distribution");

    let base = 42.0 - 0.05 * args.distance;
    let reuse_bonus = match (args.enabled, args.threshold) {
        (true, Some(threshold)) => ((threshold + 82.0) * 0.08).max(0.0),
        _ => 0.0,
    };

    (base + reuse_bonus + noise.sample(&mut rng)).max(0.1)
}

fn main() {
    let args = parse_args();

    if args.hang_secs > 0 {
        thread::sleep(Duration::from_secs(args.hang_secs));
    }
    if args.fail {
        eprintln!("mock-sim: requested failure");
        std::process::exit(1);
    }

    let throughput = synth_throughput(&args);

    println!("Mock 2BSS scenario");
    println!(
        "AP1 <-> AP2 distance: {} m, OBSS-PD {}",
        args.distance,
        if args.enabled { "enabled" } else { "disabled" }
    );
    if let Some(threshold) = args.threshold {
        println!("OBSS-PD threshold: {threshold} dBm");
    }
    println!("RngRun: {}", args.rng_run);

    if args.omit_marker {
        println!("Simulation finished without throughput report");
    } else if args.garbage_metric {
        println!("Throughput per STA:\tN/A Mbps");
    } else {
        println!("Throughput per STA:\t{throughput:.4} Mbps");
    }

    println!("Done.");
}
