use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Stdout carries the relay channel, so diagnostics for the operator go to stderr.
pub fn init() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }
}
