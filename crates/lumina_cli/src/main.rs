mod cache_stats;
mod cli;
mod dot;
mod pipeline;
mod watcher;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
