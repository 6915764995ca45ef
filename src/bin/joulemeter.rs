//! joulemeter - measure the energy of a single command.
//!
//! Runs the command once, records energy and timing as one CSV row and
//! prints a summary. The command's own stdout is passed through unless
//! `--capture-stdout` is given. The exit code reflects the harness only, never the
//! measured command.
//!
//! Usage:
//!   joulemeter "pytest tests/ml_model.py"            # perf stat, human report
//!   joulemeter --csv -- cargo test --release         # perf stat -x, with time events
//!   joulemeter -s direct -o rapl.csv "make bench"    # RAPL counter before/after

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use joulemeter::collector::energy::DEFAULT_ACCOUNTING_PATH;
use joulemeter::collector::perf::DEFAULT_ENERGY_EVENT;
use joulemeter::collector::{RealFs, ShellRunner, ToolInvocation};
use joulemeter::fmt::format_summary;
use joulemeter::{MeasureConfig, Measurer, OutputSchema, ResultSink, Strategy};

/// Default result file.
const DEFAULT_OUTPUT: &str = "energy_results.csv";

/// Energy measurement harness.
#[derive(Parser)]
#[command(name = "joulemeter", about = "Measure the energy of a command", version)]
struct Args {
    /// Command to measure, interpreted by `sh -c`. Several words are joined with spaces.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        value_name = "COMMAND"
    )]
    command: Vec<String>,

    /// CSV file the result row is appended to.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: String,

    /// Accounting strategy: `perf` (wrap the command in perf stat) or `direct` (read the RAPL counter).
    #[arg(short, long, default_value = "perf")]
    strategy: Strategy,

    /// Energy counter file for the direct strategy.
    #[arg(long, default_value = DEFAULT_ACCOUNTING_PATH)]
    rapl_path: String,

    /// perf binary for the perf strategy.
    #[arg(long, default_value = "perf")]
    perf: String,

    /// Energy event for the perf strategy.
    #[arg(short, long, default_value = DEFAULT_ENERGY_EVENT)]
    event: String,

    /// Ask perf for machine CSV output (also collects duration/user/system time events).
    #[arg(long)]
    csv: bool,

    /// Count only the measured process tree instead of system wide.
    #[arg(long)]
    no_system_wide: bool,

    /// Capture the measured command's stdout (shown with -v) instead of passing it through.
    #[arg(long)]
    capture_stdout: bool,

    /// Result file layout: `full` or `simple`. Defaults to the strategy's layout.
    #[arg(long, value_name = "SCHEMA")]
    schema: Option<OutputSchema>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber on stderr.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("joulemeter={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> MeasureConfig {
    let mut tool = if args.csv {
        ToolInvocation::machine_csv()
    } else {
        ToolInvocation::default()
    };
    tool.program = args.perf.clone();
    tool.energy_event = args.event.clone();
    tool.system_wide = !args.no_system_wide;

    let mut config = MeasureConfig::new(args.strategy)
        .with_accounting_path(&args.rapl_path)
        .with_tool(tool);
    if let Some(schema) = args.schema {
        config = config.with_schema(schema);
    }
    config
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let command = args.command.join(" ");
    let config = build_config(&args);
    info!(
        "Config: strategy={}, output={}, schema={:?}",
        config.strategy, args.output, config.schema
    );

    // The measured command shares our process group: let Ctrl-C stop it
    // while the harness stays alive to record what was consumed.
    if let Err(e) = ctrlc::set_handler(|| {
        info!("Received interrupt, waiting for measured command to exit");
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let sink = ResultSink::new(&args.output, config.schema);
    let runner = ShellRunner::new().with_captured_stdout(args.capture_stdout);
    let mut measurer = Measurer::new(config, RealFs::new(), runner);

    let measurement = match measurer.measure(&command) {
        Ok(m) => m,
        Err(e) => {
            error!("Measurement aborted: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", format_summary(&measurement));

    if let Err(e) = sink.append(&measurement.record) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    info!("Result appended to {}", sink.path().display());
}
