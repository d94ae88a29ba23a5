use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`;
/// `format` is `pretty` or `json`.
pub fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = installed {
        eprintln!("tracing subscriber already installed: {e}");
    }
}
