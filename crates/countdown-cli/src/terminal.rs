//! Terminal display driver and completion alert.

use std::io::{self, Write};
use std::time::Duration;

use countdown_core::notify::VIBRATION_PATTERN_MS;
use countdown_core::{CompletionNotifier, Event, ViewFrame};

const BAR_WIDTH: usize = 30;

/// Paints view frames either as a single live line or as JSON lines.
pub struct Renderer {
    json: bool,
    drawn: bool,
}

impl Renderer {
    pub fn new(json: bool) -> Self {
        Self { json, drawn: false }
    }

    pub fn frame(&mut self, view: &ViewFrame) -> io::Result<()> {
        let mut out = io::stdout().lock();
        if self.json {
            serde_json::to_writer(&mut out, view)?;
            return writeln!(out);
        }

        let filled = (view.ring_fraction * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        let status = if view.completion_indicator {
            "done!"
        } else if view.is_complete {
            "done"
        } else if view.is_running {
            ""
        } else {
            "paused"
        };
        // trailing spaces wipe leftovers from a longer previous line
        write!(
            out,
            "\r[{}{}] {:>8} {:>3}% {:<6}  ",
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            view.display,
            view.percentage,
            status,
        )?;
        self.drawn = true;
        out.flush()
    }

    /// Events are only written in JSON mode; the live line already reflects them.
    pub fn event(&mut self, event: &Event) -> io::Result<()> {
        if !self.json {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)
    }

    pub fn finish(self) -> Result<(), Box<dyn std::error::Error>> {
        if self.drawn {
            println!();
        }
        Ok(())
    }
}

/// Rings the terminal bell once per buzz of the vibration pattern.
pub struct TerminalNotifier {
    vibration: bool,
}

impl TerminalNotifier {
    pub fn new(vibration: bool) -> Self {
        Self { vibration }
    }

    /// Plays the pattern on a runtime task when inside one; otherwise rings
    /// once.
    fn buzz(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(play_pattern());
            }
            Err(_) => ring_bell(),
        }
    }
}

fn ring_bell() {
    let mut err = io::stderr().lock();
    let _ = err.write_all(b"\x07");
    let _ = err.flush();
}

/// Even steps of the pattern buzz, odd steps are silence.
async fn play_pattern() {
    for (i, ms) in VIBRATION_PATTERN_MS.iter().enumerate() {
        if i % 2 == 0 {
            ring_bell();
        }
        tokio::time::sleep(Duration::from_millis(*ms)).await;
    }
}

impl CompletionNotifier for TerminalNotifier {
    fn notify_complete(&mut self, total: Duration) {
        tracing::info!(total_secs = total.as_secs(), "countdown finished");
        if self.vibration {
            self.buzz();
        }
    }
}
