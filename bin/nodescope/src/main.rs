//! nodescope binary.

mod cli;
mod config;
mod run;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    run::run().await
}
