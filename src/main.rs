// Entrypoint for the CLI application.
// - Initializes the process-wide logger once, before anything else runs.
// - Keeps `main` small: parse the subcommand and hand it to the dispatcher.
// - This is the only place that terminates the process and picks the exit
//   status; everything below returns errors.

use pocketdump::cli::{self, Command};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let Some(cmd) = Command::parse(&args) else {
        eprintln!("{}", cli::USAGE);
        std::process::exit(2);
    };

    cli::run(cmd)
}
