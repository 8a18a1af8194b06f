use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = rootfield::config::Config::parse();
    rootfield::app::run(cfg)
}
