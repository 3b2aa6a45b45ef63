pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prints the startup banner unless `--simple-output` was passed.
pub fn print_banner(target: &str, threads: usize) {
    println!(
        "\nfuzzwright v{VERSION}\n  target : {target}\n  threads: {threads}\n"
    );
}

pub fn print_summary(sent: u64, matched: usize, errors: usize) {
    println!(
        "\n--- done: {sent} sent, {matched} matched, {errors} errors ---"
    );
}
