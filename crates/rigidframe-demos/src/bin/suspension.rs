use anyhow::Result;
use clap::Parser;
use rigidframe_demos::{run_demo, RunArgs, SuspensionDemo};

#[derive(Parser, Debug)]
#[command(name = "suspension", version, about = "Slider and soft distance limit between two dropped boxes")]
struct Opts {
    #[command(flatten)]
    run: RunArgs,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    run_demo::<SuspensionDemo>(&opts.run, |_| {})?;
    Ok(())
}
