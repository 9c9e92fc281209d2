use proscenium::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let default_filter = if cli.debug {
        "proscenium=debug"
    } else if cli.quiet {
        "proscenium=error"
    } else {
        "proscenium=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = cli::run(cli).await {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
