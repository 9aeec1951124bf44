use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(name = "mlplot-demo")]
#[command(about = "Drives headless figures from a worker thread through the owner bridge")]
pub struct Cli {
    /// Per-request timeout in milliseconds.
    #[arg(long, env = "MLPLOT_TIMEOUT_MS", default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Number of figures to open.
    #[arg(long, default_value_t = 2)]
    pub figures: usize,

    /// Points per plotted line.
    #[arg(long, default_value_t = 100)]
    pub points: usize,

    /// Add a 3D surface to the last figure.
    #[arg(long)]
    pub surface: bool,

    /// Label more lines than were plotted, making the owner fault.
    #[arg(long)]
    pub fail: bool,
}
