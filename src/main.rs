//! Bookless - write a book as a folder of markdown chapters
//!
//! A Rust-based markdown book editor with a chapter explorer, live preview,
//! per-book settings, and export through pandoc.

mod app;
mod core;
mod export;
mod ui;

use app::BooklessApp;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting Bookless...");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start the async runtime: {}", e);
            std::process::exit(1);
        }
    };
    let handle = runtime.handle().clone();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Bookless")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Bookless",
        native_options,
        Box::new(|cc| Ok(Box::new(BooklessApp::new(cc, handle)))),
    )
}
