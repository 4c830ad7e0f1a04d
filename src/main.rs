use anyhow::Result;
use clap::Parser;

use plink_bridge::{cli, cmdkey, test};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    match args.cmd {
        cli::Cmd::Run(opts) => cmdkey::run(opts),
        cli::Cmd::Selftest(opts) => test::run(opts),
    }
}
