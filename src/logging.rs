use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `verbose` is the `-v` count.
pub fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("devrun=warn"),
        1 => EnvFilter::new("devrun=info"),
        _ => EnvFilter::new("devrun=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
