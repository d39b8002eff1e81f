use anyhow::Result;
use clap::Parser;
use rigidframe_demos::{run_demo, RunArgs, TumbleDemo};

#[derive(Parser, Debug)]
#[command(name = "tumble", version, about = "Free box spinning in zero gravity")]
struct Opts {
    #[command(flatten)]
    run: RunArgs,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    run_demo::<TumbleDemo>(&opts.run, |_| {})?;
    Ok(())
}
