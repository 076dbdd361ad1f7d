use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use courier_config::{Diagnostic, Severity, validate_file};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics too.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the user config directory.
    Path,
}

pub fn handle_config(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(config_path, verbose),
        ConfigAction::Path => {
            match courier_config::config_dir() {
                Some(dir) => println!("{}", dir.display()),
                None => eprintln!("no user config directory on this platform"),
            }
            Ok(())
        },
    }
}

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn render(d: &Diagnostic) -> String {
    let color = match d.severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
        Severity::Info => CYAN,
    };
    let label = d.severity;
    if d.path.is_empty() {
        format!("  {BOLD}{color}{label}{RESET} {}", d.message)
    } else {
        format!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message)
    }
}

fn check(config_path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate_file(config_path);

    match result.config_path {
        Some(ref path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found.\n"),
    }

    let shown: Vec<String> = result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .map(render)
        .collect();
    for line in &shown {
        eprintln!("{line}");
    }
    if !shown.is_empty() {
        eprintln!();
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
