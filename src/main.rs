use anyhow::Result;
use clap::Parser;
use mirador::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
