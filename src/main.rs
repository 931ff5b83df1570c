use clap::Parser;
use mangashelf::config::{DEFAULT_EXTENSIONS, ServerConfig};
use mangashelf::serve;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mangashelf")]
#[command(about = "Serve a manga directory as chapter and page listings")]
#[command(long_about = "\
Serve a manga directory as chapter and page listings

Your filesystem is the data source. Subdirectories of the root are chapters,
image files inside them are pages; both are listed fresh on every request in
natural order (page2.jpg before page10.jpg).

Media structure:

  manga/
  ├── ch1/                         # Chapter (any directory name)
  │   ├── 1.png
  │   └── 2.jpg
  └── ch2/
      ├── page1.jpg
      ├── page2.jpg
      └── page10.jpg

HTTP surface:

  GET /api/chapters                # JSON array of chapter names
  GET /api/chapters/<chapter>      # JSON array of page filenames
  GET /manga/<chapter>/<page>      # Raw image bytes
  GET /health                      # Server status

Set RUST_LOG to control logging (default: info).")]
#[command(version)]
struct Cli {
    /// Root media directory containing one subdirectory per chapter
    #[arg(long, env = "MANGASHELF_ROOT", default_value = "manga")]
    root: PathBuf,

    /// Address to bind the HTTP listener to
    #[arg(long, env = "MANGASHELF_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "MANGASHELF_PORT", default_value_t = 3001)]
    port: u16,

    /// Comma-separated allowed page extensions
    #[arg(
        long,
        env = "MANGASHELF_EXTENSIONS",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string())
    )]
    extensions: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(ServerConfig::new(
        cli.root,
        cli.bind,
        cli.port,
        &cli.extensions,
    )?);

    // Not fatal: listings answer 500 until the directory shows up.
    if !config.root.is_dir() {
        tracing::warn!(
            root = %config.root.display(),
            "root media directory does not exist; listings will fail until it does"
        );
    }

    let addr = SocketAddr::new(config.bind, config.port);
    let app = serve::router(Arc::clone(&config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, root = %config.root.display(), "mangashelf listening");
    axum::serve(listener, app).await?;

    Ok(())
}
