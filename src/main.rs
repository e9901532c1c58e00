mod cli;
mod io;
mod logging;
mod options;
mod outside;
mod result;
mod session;
mod settings;
mod terminal;
mod types;

use std::{sync::Arc, thread, time::Duration};

use clap::Parser;
use miette::{miette, IntoDiagnostic, WrapErr};
use tracing::{debug, info};

use crate::{
    cli::Args,
    outside::{Ffmpeg, Ytdlp},
    session::{DownloadStart, Session, SessionState},
    settings::Settings,
    terminal::Terminal,
};

/// How often the progress line is refreshed
const REFRESH: Duration = Duration::from_millis(100);

fn main() -> miette::Result<()> {
    // Initialize the environment & CLI
    let args = Args::parse();
    logging::init_logging(args.log_level())?;

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(out) = &args.out {
        settings.out_dir = out.clone();
    }
    debug!("Settings: {settings:?}");

    // Without ffmpeg neither audio nor ranges can be processed
    let ffmpeg = Ffmpeg::new(&settings.ffmpeg)?;
    let ytdlp = Ytdlp::new(&settings.yt_dlp, &ffmpeg)?;

    // Make sure the needed directories are created
    std::fs::create_dir_all(&settings.out_dir)
        .into_diagnostic()
        .wrap_err("Could not create out directory")?;

    let request = args.request();
    let mut session = Session::new(Arc::new(ytdlp), settings.out_dir);
    let mut terminal = Terminal::default();

    info!("Fetching the video details");
    session.set_url(&request.url);
    run_until_settled(&mut session, &mut terminal);

    if session.metadata().is_none() {
        let reason = terminal
            .fetch_error
            .take()
            .unwrap_or_else(|| "no URL given".to_owned());
        return Err(miette!("Could not fetch the video details: {reason}"));
    }

    match session.start_download(&request) {
        DownloadStart::Started | DownloadStart::Rejected => {}
        DownloadStart::Busy | DownloadStart::NotReady => {
            return Err(miette!("The download could not be started"))
        }
    }
    run_until_settled(&mut session, &mut terminal);
    debug_assert_eq!(session.state(), SessionState::Idle);

    match terminal.outcome.take() {
        Some(Ok(_)) => {
            println!("Download completed!");
            Ok(())
        }
        Some(Err(message)) => Err(miette!("{message}")),
        None => Err(miette!("The download ended without reporting its outcome")),
    }
}

/// The interactive loop: apply worker events until they have all reported back
fn run_until_settled(session: &mut Session, terminal: &mut Terminal) {
    loop {
        session.pump(terminal);
        if !session.is_working() {
            break;
        }
        thread::sleep(REFRESH);
    }
}
