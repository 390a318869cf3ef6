pub mod api;
pub mod attention;
pub mod cli;
pub mod config;
pub mod deck;
pub mod error;
pub mod shell;
pub mod telemetry;
pub mod utils;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use api::{HttpLessonApi, LessonApi};
use attention::{
    CameraSource, DetectorFactory, SyntheticCamera, SyntheticDetectorFactory, UnavailableCamera,
};
use cli::Cli;
use config::{Credential, PlayerConfig};
use shell::{Command, PlaybackShell, ShellEvent, ShellServices};

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    utils::logging::init(cli.verbose);

    log::info!("Lesson player starting up...");

    // Everything runs on one thread; the shared attention cell and the deck
    // state are only ever touched from this loop.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(play(cli));
    // stdin reads park a blocking thread that would otherwise hold shutdown.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("lesson player failed: {err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn play(cli: Cli) -> Result<()> {
    let mut config = PlayerConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let credential = match &cli.token_file {
        Some(path) => Some(Credential::from_file(path)?),
        None => Credential::from_env(),
    };

    let api: Arc<dyn LessonApi> = Arc::new(HttpLessonApi::new(&config.api, credential)?);
    let camera: Arc<dyn CameraSource> = if cli.simulate {
        Arc::new(SyntheticCamera)
    } else {
        Arc::new(UnavailableCamera)
    };
    let detectors: Arc<dyn DetectorFactory> = Arc::new(SyntheticDetectorFactory::default());

    let mut shell = PlaybackShell::new(
        &config,
        ShellServices {
            api,
            camera,
            detectors,
        },
    )?;

    shell.mount().await?;
    let input = tokio::spawn(pump_stdin(shell.sender()));
    let interrupt = tokio::spawn(quit_on_ctrl_c(shell.sender()));

    let mut stdout = std::io::stdout();
    let result = shell.run(&mut stdout).await;

    shell.unmount().await?;
    input.abort();
    interrupt.abort();
    result
}

async fn pump_stdin(tx: mpsc::UnboundedSender<ShellEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                if tx.send(ShellEvent::Command(command)).is_err() {
                    break;
                }
            }
            Ok(None) | Err(_) => {
                let _ = tx.send(ShellEvent::Command(Command::Quit));
                break;
            }
        }
    }
}

async fn quit_on_ctrl_c(tx: mpsc::UnboundedSender<ShellEvent>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        let _ = tx.send(ShellEvent::Command(Command::Quit));
    }
}
