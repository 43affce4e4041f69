use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a test tracing subscriber once per binary, honoring
/// `RUST_LOG` so sync traces can be turned on when a test misbehaves.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
