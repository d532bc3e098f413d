use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use kinopath::{
    Ease, Eased, Interval, PathPtr, PathValidationKind, PathVector, PlanarWorld, Problem,
    ProblemSettings,
};

#[derive(Parser, Debug)]
#[command(name = "kinopath", version)]
struct Cli {
    /// Log kernel events to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a scenario path and print a JSON summary.
    Validate(ValidateArgs),
    /// Evaluate a scenario path at evenly spaced times.
    Sample(SampleArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Scan from the end of the path.
    #[arg(long, default_value_t = false)]
    reverse: bool,

    /// Override the scenario's validation strategy (`continuous` or `discretized`).
    #[arg(long)]
    strategy: Option<String>,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Number of samples (>= 2).
    #[arg(long, default_value_t = 11)]
    count: usize,
}

/// A planar robot following straight segments through waypoints.
#[derive(serde::Deserialize, Debug)]
struct Scenario {
    world: PlanarWorld,
    waypoints: Vec<Vec<f64>>,
    /// Total traversal time; defaults to the path length.
    #[serde(default)]
    duration: Option<f64>,
    /// Timing profile over `duration`; linear when absent.
    #[serde(default)]
    ease: Option<Ease>,
    #[serde(default)]
    settings: ProblemSettings,
}

impl Scenario {
    fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read scenario '{}'", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse scenario '{}'", path.display()))
    }

    fn problem(&self) -> anyhow::Result<Problem> {
        let dimension = self.waypoints.first().map_or(0, Vec::len);
        Ok(Problem::new(
            dimension,
            self.world.clone(),
            self.settings.clone(),
        )?)
    }

    fn path(&self, problem: &Problem) -> anyhow::Result<PathPtr> {
        if self.waypoints.len() < 2 {
            anyhow::bail!("scenario needs at least 2 waypoints");
        }
        let segments = self
            .waypoints
            .windows(2)
            .map(|w| problem.direct_path(&w[0], &w[1]))
            .collect::<Result<Vec<_>, _>>()?;
        let geometry: PathPtr = PathVector::create(segments)?;
        if self.duration.is_none() && self.ease.is_none() {
            return Ok(geometry);
        }

        let duration = self.duration.unwrap_or_else(|| geometry.length());
        let time = Interval::new(0.0, duration)?;
        let ease = self.ease.unwrap_or(Ease::Linear);
        let timing = Eased::new(ease, time, geometry.param_range())?;
        Ok(geometry.with_time_parameterization(Arc::new(timing), time)?)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Sample(args) => cmd_sample(args),
    }
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let mut scenario = Scenario::from_path(&args.in_path)?;
    if let Some(strategy) = &args.strategy {
        scenario.settings.path_validation = strategy.parse::<PathValidationKind>()?;
    }
    let problem = scenario.problem()?;
    let path = scenario.path(&problem)?;
    let report = problem.path_validation()?.validate(&path, args.reverse)?;

    let summary = serde_json::json!({
        "strategy": problem.settings().path_validation.to_string(),
        "reverse": args.reverse,
        "time_range": [path.time_range().start, path.time_range().end],
        "whole_valid": report.whole_valid,
        "certified": [report.certified.start, report.certified.end],
        "collision_at": report.collision_at,
        "checks": report.checks,
        "interrupted": report.interrupted,
        "uncertified": report.uncertified,
        "has_valid_part": report.valid_part.is_some(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    if args.count < 2 {
        anyhow::bail!("--count must be >= 2");
    }
    let scenario = Scenario::from_path(&args.in_path)?;
    let problem = scenario.problem()?;
    let path = scenario.path(&problem)?;

    let range = path.time_range();
    let samples = (0..args.count)
        .map(|i| {
            let t = range.start + range.length() * i as f64 / (args.count - 1) as f64;
            let (q, ok) = path.evaluate(t);
            serde_json::json!({ "t": t, "q": q.as_slice(), "ok": ok })
        })
        .collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&samples)?);
    Ok(())
}
