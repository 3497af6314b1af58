use env_logger::{Builder, Env};

/// Install the global logger
///
/// `RUST_LOG` is honoured, `filters` (same syntax) overrides it. Anything below
/// `warn` is hidden by default so the terminal display stays readable.
pub fn init(filters: Option<&str>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(filters) = filters {
        builder.parse_filters(filters);
    }
    if builder.try_init().is_err() {
        log::debug!("logger already installed");
    }
}
