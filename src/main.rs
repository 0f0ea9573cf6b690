use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use log::error;

use raylua::backend::Headless;
use raylua::dispatch::{NameCollision, UnknownWrite};
use raylua::{Config, Runtime};

#[derive(Parser)]
#[command(name = "raylua")]
#[command(about = "Run a Lua script against the raylib bindings", long_about = None)]
#[command(version)]
struct Cli {
    /// Script to run, overrides the config file
    script: Option<PathBuf>,
    /// Config file
    #[arg(short, long, default_value = "raylua.toml")]
    config: PathBuf,
    /// Close the window after this many frames
    #[arg(long)]
    max_frames: Option<u64>,
    /// Raise on writes to unknown properties
    #[arg(long)]
    strict_writes: bool,
    /// Let methods shadow readers of the same name
    #[arg(long)]
    allow_shadowing: bool,
    /// More logging, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn merge(&self, mut config: Config) -> Config {
        if let Some(script) = &self.script {
            config.script = script.clone();
        }
        if self.max_frames.is_some() {
            config.headless.max_frames = self.max_frames;
        }
        if self.strict_writes {
            config.dispatch.unknown_write = UnknownWrite::Raise;
        }
        if self.allow_shadowing {
            config.dispatch.name_collision = NameCollision::Shadow;
        }
        config
    }

    fn log_filter(&self, config: &Config) -> String {
        match self.verbose {
            0 => config.log_level.clone().unwrap_or_else(|| "warn".to_owned()),
            1 => "info".to_owned(),
            2 => "debug".to_owned(),
            _ => "trace".to_owned(),
        }
    }
}

fn run(config: Config) -> raylua::Result<()> {
    let backend = Rc::new(Headless::new(config.headless.clone()));
    let runtime = Runtime::new(config.dispatch, backend)?;
    runtime.run_file(&config.script)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(&cli.config) {
        Ok(config) => cli.merge(config),
        Err(e) => {
            eprintln!("{}: {e}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter(&config)))
        .init();

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("script failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
