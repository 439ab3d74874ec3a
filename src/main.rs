//! Market simulator entry point, CLI wiring, and scenario loading.

use std::path::Path;
use std::process;
use std::sync::Arc;

use gridshare::config::MarketConfig;
use gridshare::io::export::{export_readings_csv, export_trades_csv};
use gridshare::sim::SimulationClock;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    cycles: u64,
    readings_out: Option<String>,
    trades_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("gridshare - Neighborhood peer-to-peer electricity market simulator");
    eprintln!();
    eprintln!("Usage: gridshare [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>       Load scenario from TOML config file");
    eprintln!("  --preset <name>       Use a built-in preset (baseline, monsoon, dense)");
    eprintln!("  --seed <u64>          Override random seed");
    eprintln!("  --cycles <n>          Number of optimization cycles to run (default: 24)");
    eprintln!("  --readings-out <path> Export meter readings to CSV");
    eprintln!("  --trades-out <path>   Export completed trades to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve               Start REST API server with a ticking clock");
        eprintln!("  --port <u16>          API server port (default: 3000)");
    }
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        seed_override: None,
        cycles: 24,
        readings_out: None,
        trades_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--cycles" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --cycles requires a count argument");
                    process::exit(1);
                }
                if let Ok(n) = args[i].parse::<u64>() {
                    cli.cycles = n;
                } else {
                    eprintln!("error: --cycles value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--readings-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --readings-out requires a path argument");
                    process::exit(1);
                }
                cli.readings_out = Some(args[i].clone());
            }
            "--trades-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --trades-out requires a path argument");
                    process::exit(1);
                }
                cli.trades_out = Some(args[i].clone());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Runs `cycles` synchronous optimization cycles and prints a per-cycle log.
fn run_cycles(clock: &SimulationClock, cycles: u64) {
    for _ in 0..cycles {
        clock.run_cycle();
        let status = clock.status();
        let result = clock.optimization_result();
        println!(
            "tick {:>4}  hour {:>2}  {:<13}  gen {:>6.2} kW  demand {:>6.2} kW  \
             trades {:>2}  stability {:.2}",
            status.tick,
            status.hour,
            status.weather.kind.to_string(),
            status.stats.total_generation_kw,
            status.stats.total_demand_kw,
            result.pairs.len(),
            result.grid_stability,
        );
    }

    let result = clock.optimization_result();
    let status = clock.status();
    println!();
    println!("=== Summary after {cycles} cycles ===");
    println!("grid stability:  {:.2}", result.grid_stability);
    println!("equity score:    {:.2}", result.equity.equity_score);
    println!(
        "battery average: {:.1}%",
        status.stats.average_battery_pct
    );
    for note in &result.recommendations {
        println!("  - {note}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = parse_args();

    // Load config: --config takes priority, then --preset, then baseline.
    let mut config = if let Some(ref path) = cli.config_path {
        match MarketConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match MarketConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        MarketConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        config.simulation.seed = seed;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let clock = Arc::new(SimulationClock::new("gridshare", config));
    run_cycles(&clock, cli.cycles);

    let (readings, trades) = clock.telemetry();
    if let Some(ref path) = cli.readings_out {
        if let Err(e) = export_readings_csv(&readings, Path::new(path)) {
            eprintln!("error: failed to write readings CSV: {e}");
            process::exit(1);
        }
        eprintln!("Readings written to {path}");
    }
    if let Some(ref path) = cli.trades_out {
        if let Err(e) = export_trades_csv(&trades, Path::new(path)) {
            eprintln!("error: failed to write trades CSV: {e}");
            process::exit(1);
        }
        eprintln!("Trades written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;

        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        rt.block_on(async {
            clock.start();
            gridshare::api::serve(clock, addr).await;
        });
    }
}
