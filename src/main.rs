mod app;
mod cli;
mod config;
mod data;
mod request;

fn main() -> anyhow::Result<()> {
    cli::run()
}
