/// Entry point of the Connstat Exporter.
///
/// Serves local TCP connection counts per address family and state in the
/// Prometheus text format.
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., invalid environment
/// variables or an unavailable listen address).
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug LISTEN_ADDR=127.0.0.1:9182 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    connstat_exporter::run().await
}
