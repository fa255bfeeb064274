use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr; stdout carries the layout JSON.
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("org_chart_rs=warn")),
        )
        .init();

    if let Err(err) = org_chart_rs::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
