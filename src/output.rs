use console::Style;

use crate::error::FileIssue;
use crate::mutants::MutationTable;
use crate::orchestrator::RunReport;
use crate::state::LogEntry;

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_success(msg: &str) {
    let style = Style::new().green().bold();
    println!("{} {}", style.apply_to("✓"), msg);
}

pub fn print_warning(msg: &str) {
    let style = Style::new().yellow().bold();
    eprintln!("{} {}", style.apply_to("!"), msg);
}

pub fn print_issues(issues: &[FileIssue]) {
    for issue in issues {
        print_warning(&format!(
            "{:?} failed for {}: {}",
            issue.stage,
            issue.path.display(),
            issue.message
        ));
    }
}

pub fn print_run_report(report: &RunReport, verbose: bool) {
    let result = &report.result;

    if result.tests_passed {
        let style = Style::new().green().bold();
        println!(
            "{} {} passed / {} total ({} suites passed)",
            style.apply_to("✓"),
            result.passed,
            result.total_tests,
            result.suites,
        );
    } else {
        let style = Style::new().yellow().bold();
        println!(
            "{} {} failed, {} passed / {} total ({} suites passed)",
            style.apply_to("!"),
            result.failed,
            result.passed,
            result.total_tests,
            result.suites,
        );
    }

    let dim = Style::new().dim();
    for path in &report.recovered {
        println!("  {} recovered {} from an interrupted run", dim.apply_to("·"), path.display());
    }
    for key in &report.unknown_keys {
        println!("  {} unknown key {} ignored", dim.apply_to("·"), key);
    }

    for applied in &report.applied {
        let key_style = Style::new().cyan().bold();
        println!(
            "  {} {}",
            key_style.apply_to(applied.keys.join(", ")),
            dim.apply_to(applied.path.display()),
        );
        if verbose {
            for line in applied.diff.lines() {
                if line.starts_with('-') {
                    println!("    {}", Style::new().red().apply_to(line));
                } else if line.starts_with('+') {
                    println!("    {}", Style::new().green().apply_to(line));
                }
            }
        }
    }

    print_issues(&report.issues);

    if verbose {
        println!();
        println!("{}", result.output);
    }
}

pub fn print_logs(logs: &[LogEntry]) {
    if logs.is_empty() {
        println!("No test runs logged yet.");
        return;
    }
    let dim = Style::new().dim();
    for entry in logs {
        let marker = if entry.failed == 0 {
            Style::new().green().bold().apply_to("✓")
        } else {
            Style::new().yellow().bold().apply_to("!")
        };
        let forced = if entry.failed_tests.is_empty() {
            String::new()
        } else {
            format!(" [{}]", entry.failed_tests.join(", "))
        };
        println!(
            "{} {} {} passed, {} failed, {} total{}",
            marker,
            dim.apply_to(&entry.date),
            entry.passed,
            entry.failed,
            entry.total,
            forced,
        );
    }
}

pub fn print_table(table: &MutationTable) {
    let key_style = Style::new().cyan().bold();
    let dim = Style::new().dim();
    for m in table.iter() {
        println!("  {} {}", key_style.apply_to(&m.key), dim.apply_to(&m.file));
    }
}
