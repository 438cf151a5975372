use testrun::output;
use testrun::{Config, Orchestrator};

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "testrun", version, about = "Run the API test suite with chosen assertions forced to fail")]
struct Cli {
    /// Project root: working directory of the test command
    #[arg(long, env = "TESTRUN_ROOT", default_value = ".", global = true)]
    root: PathBuf,
    /// Test command to execute
    #[arg(long, env = "TESTRUN_TEST_CMD", default_value = testrun::config::DEFAULT_TEST_CMD, global = true)]
    test_cmd: String,
    /// Kill the test command after this many seconds (0 waits forever)
    #[arg(long, env = "TESTRUN_TIMEOUT_SECS", default_value = "300", global = true)]
    timeout_secs: u64,
    /// Run log location (default: <root>/test-logs.json)
    #[arg(long, env = "TESTRUN_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,
    /// Total reported when no counts can be parsed
    #[arg(long, env = "TESTRUN_EXPECTED_TOTAL", default_value = "36", global = true)]
    expected_total: u64,
    /// Jest JSON report to read instead of parsing text output
    #[arg(long, env = "TESTRUN_RESULTS_FILE", global = true)]
    results_file: Option<PathBuf>,
    /// JSON mutation table replacing the built-in one
    #[arg(long, env = "TESTRUN_TABLE", global = true)]
    table: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite, forcing the given tests to fail
    Run {
        /// Test key to force to fail (repeatable)
        #[arg(short, long = "fail")]
        fail: Vec<String>,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
        /// Show mutation diffs and the captured output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show logged test runs, newest first
    Logs {
        #[arg(long)]
        json: bool,
        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// List the test keys that can be forced to fail
    Keys {
        #[arg(long)]
        json: bool,
    },
    /// Restore test files left mutated by an interrupted run
    Recover,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = build_config(&cli);
    let orchestrator = match Orchestrator::new(config) {
        Ok(o) => o,
        Err(e) => {
            output::print_error(&e.to_string());
            process::exit(2);
        }
    };

    let exit_code = match cli.command {
        Commands::Run { fail, json, verbose } => cmd_run(&orchestrator, &fail, json, verbose),
        Commands::Logs { json, limit } => cmd_logs(&orchestrator, json, limit),
        Commands::Keys { json } => cmd_keys(&orchestrator, json),
        Commands::Recover => cmd_recover(&orchestrator),
    };

    process::exit(exit_code);
}

fn init_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Config {
    let root = std::path::absolute(&cli.root).unwrap_or_else(|_| cli.root.clone());
    let timeout = match cli.timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let mut config = Config::new(root)
        .with_test_cmd(cli.test_cmd.clone())
        .with_timeout(timeout)
        .with_expected_total(cli.expected_total);
    if let Some(path) = &cli.log_file {
        config = config.with_log_file(path);
    }
    if let Some(path) = &cli.results_file {
        config = config.with_results_file(path);
    }
    if let Some(path) = &cli.table {
        config = config.with_table_file(path);
    }
    config
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(e) => output::print_error(&format!("Failed to serialize output: {}", e)),
    }
}

fn cmd_run(orchestrator: &Orchestrator, fail: &[String], json_mode: bool, verbose: bool) -> i32 {
    match orchestrator.run_tests(fail) {
        Ok(report) => {
            if json_mode {
                print_json(&report.result);
                output::print_issues(&report.issues);
            } else {
                output::print_run_report(&report, verbose);
            }
            if report.result.tests_passed { 0 } else { 1 }
        }
        Err(e) => {
            if json_mode {
                print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
            } else {
                output::print_error(&e.to_string());
            }
            3
        }
    }
}

fn cmd_logs(orchestrator: &Orchestrator, json_mode: bool, limit: Option<usize>) -> i32 {
    let mut logs = match orchestrator.get_test_logs() {
        Ok(l) => l,
        Err(e) => {
            if json_mode {
                print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
            } else {
                output::print_error(&e.to_string());
            }
            return 3;
        }
    };
    if let Some(n) = limit {
        logs.truncate(n);
    }
    if json_mode {
        print_json(&serde_json::json!({ "success": true, "logs": logs }));
    } else {
        output::print_logs(&logs);
    }
    0
}

fn cmd_keys(orchestrator: &Orchestrator, json_mode: bool) -> i32 {
    let table = orchestrator.table();
    if json_mode {
        let entries: Vec<_> = table.iter().collect();
        print_json(&entries);
    } else {
        output::print_table(table);
    }
    0
}

fn cmd_recover(orchestrator: &Orchestrator) -> i32 {
    let (restored, issues) = orchestrator.recover();
    output::print_issues(&issues);
    if !issues.is_empty() {
        return 3;
    }
    if restored.is_empty() {
        output::print_success("Nothing to recover.");
    } else {
        for path in &restored {
            output::print_success(&format!("Restored {}", path.display()));
        }
    }
    0
}
