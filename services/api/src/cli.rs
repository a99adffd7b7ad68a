use crate::demo::{run_calendar, run_demo, run_import, CalendarArgs, DemoArgs, ImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use registrar::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Registrar",
    about = "Run and demonstrate the university registrar service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the standard academic calendar for a school year
    Calendar(CalendarArgs),
    /// Load a course catalog CSV into the store
    ImportCourses(ImportArgs),
    /// Walk an admission and an enrollment through their workflows
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON snapshot backing the store (overrides REGISTRAR_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Calendar(args) => run_calendar(args),
        Command::ImportCourses(args) => run_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
