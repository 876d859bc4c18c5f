use hamster_cli::cli::{report_error, run};

fn main() {
    // ANSI escapes for bold headers on Windows consoles; a no-op elsewhere
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        std::process::exit(report_error(&e));
    }
}
