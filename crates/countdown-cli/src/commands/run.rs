use std::time::Duration;

use clap::Args;
use countdown_core::{
    AppConfig, Configuration, ConfigurationStore, CountdownSession, FrameQueue, KeyValueStore,
    SessionOptions, SystemClock, TimerEngine, TimerState,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use super::open_store;
use crate::terminal::{Renderer, TerminalNotifier};

type Session =
    CountdownSession<SystemClock, FrameQueue, Box<dyn KeyValueStore>, TerminalNotifier>;

#[derive(Args)]
pub struct RunArgs {
    /// Duration such as `90`, `1m30s`, `1h5m` or `01:30`
    duration: Option<String>,
    /// Hours
    #[arg(long)]
    hours: Option<i64>,
    /// Minutes
    #[arg(short, long)]
    minutes: Option<i64>,
    /// Seconds
    #[arg(short, long)]
    seconds: Option<i64>,
    /// Repeat the most recently started countdown
    #[arg(long, conflicts_with_all = ["duration", "hours", "minutes", "seconds"])]
    last: bool,
    /// Use quick-select shortcut 1, 2 or 3
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3),
          conflicts_with_all = ["duration", "hours", "minutes", "seconds", "last"])]
    shortcut: Option<u8>,
    /// Emit one JSON object per frame and event instead of a live readout
    #[arg(long)]
    json: bool,
}

fn resolve(args: &RunArgs, session: &Session) -> Result<Configuration, Box<dyn std::error::Error>> {
    if let Some(text) = &args.duration {
        return Ok(text.parse()?);
    }
    if args.hours.is_some() || args.minutes.is_some() || args.seconds.is_some() {
        return Ok(Configuration::new(
            args.hours.unwrap_or(0),
            args.minutes.unwrap_or(0),
            args.seconds.unwrap_or(0),
        ));
    }
    if let Some(n) = args.shortcut {
        return Ok(session.shortcuts()[usize::from(n) - 1]);
    }
    if args.last {
        return session
            .store()
            .most_recent()
            .ok_or_else(|| "no recent countdown to repeat".into());
    }
    Err("no duration given (try `countdown run 5m`)".into())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_or_default();
    let engine =
        TimerEngine::new(SystemClock, FrameQueue::new()).with_policy(config.refresh_policy());
    let store: ConfigurationStore<Box<dyn KeyValueStore>> = open_store();
    let notifier = TerminalNotifier::new(config.notifications.vibration);
    let mut session = CountdownSession::new(engine, store, notifier, SessionOptions::from(&config));

    let configuration = resolve(&args, &session)?;
    session.set_configuration(configuration);
    if !session.can_start() {
        return Err("nothing to count down: duration is zero".into());
    }

    let frame_interval = config.refresh_policy().frame_interval;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(&mut session, frame_interval, Renderer::new(args.json)));
    // stdin reads sit on a blocking thread that would otherwise hold shutdown
    runtime.shutdown_background();
    result
}

/// Host loop: deliver frames at the configured cadence and forward stdin
/// commands (`p` pause/resume, `r` reset, `q` quit) until the countdown
/// finishes and its completion indicator has gone out.
async fn drive(
    session: &mut Session,
    frame_interval: Duration,
    mut out: Renderer,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(event) = session.start() {
        out.event(&event)?;
    }
    out.frame(&session.view())?;

    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(frame) = session.engine_mut().scheduler_mut().take_due() {
                    if let Some(view) = session.on_frame(frame) {
                        out.frame(&view)?;
                        if view.is_complete {
                            if let Some(done) = session.engine().completed_event() {
                                out.event(&done)?;
                            }
                        }
                    }
                }
                let finished = session.state() == TimerState::Completed;
                if finished && !session.completion_indicator_active() {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                let event = match line? {
                    None => {
                        stdin_open = false;
                        None
                    }
                    Some(cmd) => match cmd.trim() {
                        "p" | "" => session.toggle_pause(),
                        "r" => session.reset(),
                        "q" => break,
                        other => {
                            tracing::debug!("ignoring input {other:?}");
                            None
                        }
                    },
                };
                if let Some(event) = event {
                    out.event(&event)?;
                    out.frame(&session.view())?;
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    if let Some(event) = session.go_home() {
        out.event(&event)?;
    }
    out.finish()
}
