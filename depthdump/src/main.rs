/*!
    Depth Dump

    Replays a recorded sensor session, converts every frame of the selected
    stream into a packed image, stores the images as named matrices and
    optionally writes PNG previews.

    Usage:
      depthdump synth recording/ --format depth --width 640 --height 480
      depthdump inspect recording/
      depthdump convert recording/ --store frames.jsonl --preview-dir preview/
      depthdump probe frames.jsonl d0 320 240

    Set `RUST_LOG=debug` for per-frame logging.
*/

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod capture;
mod cli;
mod config;
mod events;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    cli::Args::parse().run()
}
