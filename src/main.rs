//! MLFQ + demand paging simulator - step driver
//!
//! Usage: mlfq-vm-sim [OPTIONS] <workload_file> [report_file]
//!
//! Arguments:
//!   workload_file - One process per line: name arrival_time total_time task size
//!   report_file   - Where to write the final state (stdout if omitted)
//!
//! Options:
//!   -n, --steps N  Maximum number of schedule() calls (default 50)
//!       --seed N   Seed for instruction generation and page choice
//!   -v, --verbose  Debug logging and the full state after each step
//!   -h, --help     Print help information

use std::env;
use std::process;

use log::LevelFilter;

use mlfq_vm_sim::io::{render_report, write_report, Workload};
use mlfq_vm_sim::workload::RandomWorkload;
use mlfq_vm_sim::{Config, Scheduler, StepOutcome};

const DEFAULT_STEPS: u64 = 50;

/// Command-line configuration
struct Options {
    workload_file: String,
    report_file: Option<String>,
    steps: u64,
    seed: Option<u64>,
    verbose: bool,
}

fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if options.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = run(&options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn print_help(program: &str) {
    eprintln!("MLFQ scheduler with demand paging - steps a process workload");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <workload_file> [report_file]", program);
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  workload_file - One process per line: name arrival_time total_time task size");
    eprintln!("  report_file   - Output file for the final state (stdout if omitted)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -n, --steps N  Maximum number of scheduling steps (default {})", DEFAULT_STEPS);
    eprintln!("      --seed N   Seed for reproducible runs");
    eprintln!("  -v, --verbose  Debug logging and the full state after every step");
    eprintln!("  -h, --help     Print this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} workload.txt", program);
    eprintln!("  {} -v --seed 7 -n 100 workload.txt report.txt", program);
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("mlfq-vm-sim");

    let mut steps = DEFAULT_STEPS;
    let mut seed = None;
    let mut verbose = false;
    let mut positional: Vec<&String> = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help(program);
                process::exit(0);
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            "-n" | "--steps" => {
                steps = parse_number(arg, iter.next())?;
            }
            "--seed" => {
                seed = Some(parse_number(arg, iter.next())?);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}\nUse --help for usage information.", arg));
            }
            _ => {
                positional.push(arg);
            }
        }
    }

    if positional.is_empty() || positional.len() > 2 {
        print_help(program);
        return Err(format!("\nError: Expected 1 or 2 arguments, got {}", positional.len()));
    }

    Ok(Options {
        workload_file: positional[0].clone(),
        report_file: positional.get(1).map(|s| s.to_string()),
        steps,
        seed,
        verbose,
    })
}

fn parse_number(option: &str, value: Option<&String>) -> Result<u64, String> {
    let value = value.ok_or_else(|| format!("Option {} needs a value", option))?;
    value
        .parse()
        .map_err(|_| format!("Invalid value for {}: {}", option, value))
}

fn run(options: &Options) -> Result<(), mlfq_vm_sim::SimError> {
    let workload = Workload::from_file(&options.workload_file)?;

    let config = Config::default();
    let source = match options.seed {
        Some(seed) => RandomWorkload::seeded(seed, &config),
        None => RandomWorkload::from_entropy(&config),
    };
    let mut scheduler = Scheduler::new(config, Box::new(source))?;

    log::info!(
        "loaded {} process(es) from {}, running up to {} step(s)",
        workload.processes.len(),
        options.workload_file,
        options.steps
    );
    workload.apply(&mut scheduler);

    let mut cursor = scheduler.events().next_seq();
    let mut idle_steps = 0;
    for _ in 0..options.steps {
        let outcome = scheduler.schedule()?;
        if outcome == StepOutcome::Idle {
            idle_steps += 1;
        }

        for event in scheduler.events().since(cursor) {
            println!("{}", event);
        }
        cursor = scheduler.events().next_seq();

        if options.verbose {
            println!("{}", render_report(&scheduler));
        }
        if scheduler.is_drained() {
            log::info!("all processes finished after {} step(s)", scheduler.tick());
            break;
        }
    }

    log::info!(
        "{} finished, {} still live, {} idle step(s)",
        scheduler.finished().len(),
        scheduler.registry().len(),
        idle_steps
    );

    match &options.report_file {
        Some(path) => {
            write_report(path, &scheduler)?;
            log::info!("report written to {}", path);
        }
        None => print!("{}", render_report(&scheduler)),
    }

    Ok(())
}
