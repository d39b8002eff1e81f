use anyhow::Result;
use clap::Parser;
use rigidframe_demos::{run_demo, RunArgs, PendulumDemo};

#[derive(Parser, Debug)]
#[command(name = "pendulum", version, about = "Two-link hinge pendulum under weak gravity")]
struct Opts {
    #[command(flatten)]
    run: RunArgs,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    run_demo::<PendulumDemo>(&opts.run, |_| {})?;
    Ok(())
}
