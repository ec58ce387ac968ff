use clap::Parser;

use assessrec_cli::{init_tracing, run, Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();
    run(args)
}
