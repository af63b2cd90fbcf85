//! Error display for the CLI.

use colored::Colorize;
use dusts_upgrade::SuiteError;

/// Print an error and its causes, with a hint for common setup mistakes.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
    }

    if let Some(suite_err) = err.downcast_ref::<SuiteError>() {
        match suite_err {
            SuiteError::MissingEnv(var) => {
                eprintln!(
                    "\n{}",
                    format!("Hint: export {var} before running this command.").yellow()
                );
            }
            SuiteError::AlreadyDeployed(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: delete the existing deployments with `bosh delete deployment`.".yellow()
                );
            }
            _ => {}
        }
    }
}
