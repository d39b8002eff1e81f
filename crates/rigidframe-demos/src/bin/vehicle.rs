use anyhow::Result;
use clap::Parser;
use rigidframe_demos::{run_demo, RunArgs, VehicleDemo};
use rigidframe_vehicles::DriverInput;

#[derive(Parser, Debug)]
#[command(name = "vehicle", version, about = "Three-wheeled vehicle on flat ground")]
struct Opts {
    #[command(flatten)]
    run: RunArgs,

    /// Throttle in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    forward: f32,

    /// Brake, or reverse when stopped, in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    backward: f32,

    /// Steering in [-1, 1]
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    steering: f32,

    /// Handbrake in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    handbrake: f32,

    /// Print the chassis position after every step
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let input = DriverInput { forward: opts.forward, backward: opts.backward, steering: opts.steering, handbrake: opts.handbrake };
    let trace = opts.trace;
    run_demo::<VehicleDemo>(&opts.run, |demo| {
        demo.input = input;
        demo.log_position = trace;
    })?;
    Ok(())
}
