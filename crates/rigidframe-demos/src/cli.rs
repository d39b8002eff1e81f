//! Options shared by every demo binary and the runner behind them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rigidframe_render::{ConsoleSink, FrameSink, JsonLinesSink, NullSink, PoseExtractor, RenderConfig};
use rigidframe_runtime::{DtPolicy, FrameClock, LoopSettings, Presenter, RunSummary, SimulatedClock, SimulationContext, StepLoop, SystemClock};
use rigidframe_viz::DebugSettings;
use rigidframe_world::{WorldBuilder, WorldSettings};

use crate::scenes::{Demo, DemoHooks};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DtPolicyArg {
    PassThrough,
    Clamp,
    Fixed,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Stop after this many seconds of clock time
    #[arg(long, env = "RFRAME_SECONDS", default_value_t = 10.0)]
    pub seconds: f64,

    /// How frame time becomes world steps
    #[arg(long, value_enum, default_value_t = DtPolicyArg::Clamp)]
    pub dt_policy: DtPolicyArg,

    /// Largest single step for `--dt-policy clamp`
    #[arg(long, default_value_t = 0.25)]
    pub max_dt: f32,

    /// Step length for `--dt-policy fixed`
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub fixed_dt: f32,

    /// Print poses every N frames (0 = never)
    #[arg(long, env = "RFRAME_PRINT_EVERY", default_value_t = 60)]
    pub print_every: u64,

    /// Write frames as JSON lines to this file instead of printing them
    #[arg(long)]
    pub frames_out: Option<PathBuf>,

    /// World settings JSON; replaces the scene's defaults
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Pace frames to the wall clock at 60 Hz instead of simulating the clock
    #[arg(long)]
    pub realtime: bool,

    /// Dump the world's debug block every N steps (0 = never)
    #[arg(long, default_value_t = 0)]
    pub debug_every: u64,
}

impl RunArgs {
    pub fn dt_policy(&self) -> DtPolicy {
        match self.dt_policy {
            DtPolicyArg::PassThrough => DtPolicy::PassThrough,
            DtPolicyArg::Clamp => DtPolicy::Clamp { max_dt: self.max_dt },
            DtPolicyArg::Fixed => DtPolicy::FixedStep { step: self.fixed_dt, max_steps: 8 },
        }
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings { dt_policy: self.dt_policy(), max_seconds: Some(self.seconds), ..Default::default() }
    }

    fn world_settings<D: Demo>(&self) -> Result<WorldSettings> {
        match &self.settings {
            Some(path) => WorldSettings::from_json_file(path).with_context(|| format!("loading {}", path.display())),
            None => Ok(D::world_settings()),
        }
    }

    fn sink(&self) -> Result<Box<dyn FrameSink>> {
        Ok(match &self.frames_out {
            Some(path) => Box::new(JsonLinesSink::create(path).with_context(|| format!("creating {}", path.display()))?),
            None if self.print_every > 0 => Box::new(ConsoleSink::new(self.print_every)),
            None => Box::new(NullSink),
        })
    }
}

/// Build `D`, let `configure` adjust it, run until the time bound and tear down.
pub fn run_demo<D: Demo>(args: &RunArgs, configure: impl FnOnce(&mut D)) -> Result<RunSummary> {
    let world = WorldBuilder::new()
        .settings(args.world_settings::<D>()?)
        .policy(D::policy())
        .debug(DebugSettings::every(args.debug_every))
        .build()
        .context("world init")?;
    println!("[{}] {} job threads", D::NAME, world.job_threads());

    let mut ctx = SimulationContext::new(world);
    let mut demo = D::build(&mut ctx).with_context(|| format!("building {} scene", D::NAME))?;
    configure(&mut demo);

    let mut extractor = PoseExtractor::new();
    demo.drawables(ctx.world(), &mut extractor)?;
    let mut presenter = Presenter::new(extractor, args.sink()?, RenderConfig::default());

    let summary = if args.realtime {
        drive(&mut ctx, &mut demo, &mut presenter, SystemClock::paced(60.0), args)?
    } else {
        drive(&mut ctx, &mut demo, &mut presenter, SimulatedClock::new(1.0 / 60.0), args)?
    };
    println!(
        "[{}] {} frames, {:.2}s simulated, {:.2}s dropped, stop: {:?}",
        D::NAME, summary.frames, summary.sim_time, summary.dropped, summary.reason
    );
    if presenter.failures() > 0 {
        eprintln!("[{}] {} render failures", D::NAME, presenter.failures());
    }
    presenter.finish();
    ctx.teardown().context("teardown")?;
    Ok(summary)
}

fn drive<D: Demo, C: FrameClock, S: FrameSink>(
    ctx: &mut SimulationContext,
    demo: &mut D,
    presenter: &mut Presenter<S>,
    clock: C,
    args: &RunArgs,
) -> Result<RunSummary> {
    let mut step_loop = StepLoop::new(clock, args.loop_settings()).context("loop settings")?;
    for id in demo.keep_awake() { step_loop.keep_awake(id); }
    let mut hooks = (DemoHooks(demo), presenter);
    ctx.run(&mut step_loop, &mut hooks).context("simulation")
}
