mod cli;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mlplot_bridge::{BridgeConfig, CallArgs, Controller, WorkerContext, init_tracing};
use mlplot_figures::{Desktop, PlotContext, register_kinds};
use serde_json::json;
use tracing::{info, warn};

use cli::Cli;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if cli.figures == 0 {
        bail!("--figures must be at least 1");
    }

    let timeout = Duration::from_millis(cli.timeout_ms);
    let config = BridgeConfig::default().with_request_timeout(timeout);
    let desktop = Desktop::new();
    let mut controller = Controller::new(config);
    register_kinds(&mut controller, &desktop).context("register figure kinds")?;

    let settings = cli.clone();
    let status = controller.run(move |ctx| drive(ctx, &settings));

    for (index, title) in desktop.open_windows() {
        warn!(figure = %index, title, "window left open");
    }
    info!(
        closed = desktop.closed_windows().len(),
        raised = desktop.raised_windows().len(),
        state = %status.state(),
        "demo finished"
    );
    status.into_result().context("plotting session failed")
}

fn drive(ctx: &WorkerContext, cli: &Cli) -> Result<()> {
    let mut plots = PlotContext::new(ctx);
    for figure in 0..cli.figures {
        let title = format!("Run {}", figure + 1);
        plots
            .figure(CallArgs::new().with_kwarg("title", title))
            .context("open figure")?;
        let phase = figure as f64;
        let x: Vec<f64> = (0..cli.points).map(|i| i as f64 / 10.0).collect();
        let sin: Vec<f64> = x.iter().map(|t| (t + phase).sin()).collect();
        let cos: Vec<f64> = x.iter().map(|t| (t + phase).cos()).collect();
        plots.plot(CallArgs::positional([json!(x), json!(sin)]))?;
        plots.plot(CallArgs::positional([json!(x), json!(cos)]).with_kwarg("style", "--"))?;

        let axis = plots.gca()?;
        axis.set_grid(true)?;
        axis.set_xlabel("t".to_string())?;
        axis.set_ylabel("amplitude".to_string())?;

        let mut labels = vec!["sin", "cos"];
        if cli.fail {
            labels.push("tan");
        }
        match plots.legend(labels) {
            Ok(labelled) => info!(figure, labelled, "legend added"),
            Err(err) => warn!(figure, error = %err, "legend rejected"),
        }
    }

    if cli.surface {
        let grid: Vec<f64> = (0..10).map(|i| i as f64 / 3.0).collect();
        let z: Vec<Vec<f64>> = grid
            .iter()
            .map(|x| grid.iter().map(|y| (x * x + y * y).sqrt().sin()).collect())
            .collect();
        plots.surf(CallArgs::positional([json!(grid), json!(grid), json!(z)]))?;
    }

    let first = plots.figures().iter().next().map(|figure| figure.index());
    if let Some(first) = first {
        plots.select_figure(first)?;
    }
    let status = ctx.owner_status()?;
    info!(
        figures = status.live("figure"),
        axes = status.live("axis"),
        "owner objects live before exit"
    );
    Ok(())
}
