mod app;

use app::Cli;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    app::run(cli)
}
