//! Command-line interface for the `monsync` application.
//!
//! This crate serves as the main entry point for the executable, delegating
//! its functionality to the `monsync-server` crate.

fn main() -> anyhow::Result<()> {
    monsync_server::run()
}
