//! `opticsim`: a non-interactive front-end over [`opticsim_core`]. Loads a
//! recipe, builds the composite model, and prints optical-path diagnostics
//! (spec.md §6). The recipe language's interactive "render loop bound to a
//! DOF" is out of scope for this binary; `--drive-t` is a headless stand-in
//! that re-evaluates the model at each step of a DOF sweep instead.

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use opticsim_core::{parse, CompositeModel};
use tracing::info;

/// opticsim — build and inspect an opto-mechanical recipe
#[derive(Parser, Debug)]
#[command(
    name = "opticsim",
    version,
    about = "Loads an optical recipe, builds the composite model, and reports its optical paths",
    after_help = "EXAMPLES:\n  \
                  opticsim recipe.rzl\n  \
                  opticsim recipe.rzl --drive-t 0.0:1.0:0.25\n  \
                  cat recipe.rzl | opticsim -"
)]
struct Cli {
    /// Recipe file to load, or `-` to read from stdin
    path: String,

    /// Sweep a DOF named `t` over `start:stop:step`, re-evaluating the model
    /// and printing one diagnostic line per step
    #[arg(long, value_name = "START:STOP:STEP")]
    drive_t: Option<String>,
}

fn read_source(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading recipe from stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("reading recipe file '{path}'"))
    }
}

fn print_report(model: &CompositeModel) {
    let mut names: Vec<&str> = model.element_names().collect();
    names.sort_unstable();
    println!("elements: {}", names.len());
    for name in &names {
        let element = model.element(name).expect("name came from element_names()");
        println!("  {name}: {} surface(s), {} port(s)", element.surfaces().len(), element.ports().len());
    }

    let mut paths: Vec<&str> = model.paths().map(|p| p.name.as_str()).collect();
    paths.sort_unstable();
    println!("paths: {}", paths.len());
    for name in &paths {
        let path = model.path(name).expect("name came from paths()");
        println!("  {name}: {}", path.elements.join(" -> "));
    }
}

fn drive_t(model: &mut CompositeModel, spec: &str) -> Result<()> {
    let parts: Vec<&str> = spec.split(':').collect();
    let [start, stop, step] = parts.as_slice() else {
        anyhow::bail!("--drive-t expects START:STOP:STEP, got '{spec}'");
    };
    let start: f64 = start.parse().with_context(|| format!("parsing drive-t start '{start}'"))?;
    let stop: f64 = stop.parse().with_context(|| format!("parsing drive-t stop '{stop}'"))?;
    let step: f64 = step.parse().with_context(|| format!("parsing drive-t step '{step}'"))?;
    if step <= 0.0 {
        anyhow::bail!("--drive-t step must be positive, got {step}");
    }

    let mut t = start;
    while t <= stop + step * 1e-9 {
        if !model.set_dof("t", t) {
            println!("t = {t:.6}: rejected (out of DOF bounds)");
        } else {
            println!("t = {t:.6}: ok");
        }
        t += step;
    }
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let source = read_source(&cli.path)?;
    let recipe = parse(&cli.path, &source).with_context(|| format!("parsing '{}'", cli.path))?;
    info!(path = %cli.path, statements = recipe.statements.len(), "parsed recipe");

    let mut model = CompositeModel::build(&recipe).context("building composite model")?;
    info!("built composite model");
    print_report(&model);

    if let Some(spec) = &cli.drive_t {
        drive_t(&mut model, spec)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::layer::SubscriberExt;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
