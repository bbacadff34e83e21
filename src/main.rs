mod app;
mod carousel;
mod config;
mod image_loader;
mod models;
mod ui;

use app::FolioApp;
use tracing_subscriber::EnvFilter;

fn main() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "folio=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting folio {}", env!("CARGO_PKG_VERSION"));
    let app = FolioApp::new();
    std::process::exit(app.run());
}
