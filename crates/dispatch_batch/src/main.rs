use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{info, warn};

use dispatch_batch::runner::{run_schedule, BatchConfig};
use dispatch_batch::{report, roster};
use dispatch_core::clock::{VirtualClock, DEFAULT_MULTIPLIER};
use dispatch_core::coordinator::Dispatcher;
use dispatch_core::engine::PricingEngine;
use dispatch_core::matching::SelectionPolicyKind;
use dispatch_core::pricing::TariffSchedule;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Nearest,
    Balanced,
}

impl From<PolicyArg> for SelectionPolicyKind {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Nearest => SelectionPolicyKind::Nearest,
            PolicyArg::Balanced => SelectionPolicyKind::Balanced,
        }
    }
}

#[derive(Parser)]
#[command(name = "dispatch_batch")]
#[command(about = "Batch ride-dispatch simulation over flat-file rosters")]
struct Cli {
    /// Vehicle schedule input file (generated when absent)
    #[arg(long, default_value = "vehicles_input.txt")]
    vehicles_file: PathBuf,

    /// Affiliated clients input file (generated when absent)
    #[arg(long, default_value = "clients_input.txt")]
    clients_file: PathBuf,

    /// Ride requests generated per simulated day
    #[arg(long, default_value_t = 5)]
    requests_per_day: usize,

    /// RNG seed for request traffic
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Directory for generated reports
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Virtual clock acceleration factor
    #[arg(long, default_value_t = DEFAULT_MULTIPLIER)]
    clock_multiplier: f64,

    /// Vehicle selection policy
    #[arg(long, value_enum, default_value = "nearest")]
    policy: PolicyArg,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    roster::write_example_inputs(&cli.vehicles_file, &cli.clients_file)?;
    let schedule = roster::load_vehicle_schedule(&cli.vehicles_file)?;
    let clients = roster::load_clients(&cli.clients_file)?;
    info!(
        "loaded {} day(s) of vehicles and {} affiliated clients",
        schedule.days,
        clients.len()
    );

    let engine = PricingEngine::new(
        VirtualClock::new(cli.clock_multiplier),
        TariffSchedule::default(),
        cli.policy.into(),
    );
    let dispatcher = Dispatcher::new(engine);
    dispatcher.spawn_hour_monitor();

    fs::create_dir_all(&cli.out_dir)?;
    let daily_path = cli.out_dir.join("daily_report.txt");
    let config = BatchConfig {
        requests_per_day: cli.requests_per_day,
        seed: cli.seed,
    };

    run_schedule(&dispatcher, &schedule, &clients, &config, |day, dispatcher| {
        let (snapshot, _) = dispatcher.reports();
        if let Err(err) = report::append_daily_report(&daily_path, &snapshot) {
            warn!("day {day}: failed to write daily report: {err}");
        }
    });

    let (_, monthly) = dispatcher.reports();
    let mut monthly_file = fs::File::create(cli.out_dir.join("monthly_report.txt"))?;
    report::write_monthly_report(&mut monthly_file, &monthly)?;

    let control = dispatcher.control_log();
    let mut control_file = fs::File::create(cli.out_dir.join("control_log.txt"))?;
    report::write_control_log(&mut control_file, &control)?;
    report::export_control_log_csv(&cli.out_dir.join("control_log.csv"), &control)?;

    dispatcher.stop_monitor();
    info!(
        "run complete: {} control records across {} day(s)",
        control.len(),
        schedule.days
    );
    Ok(())
}
