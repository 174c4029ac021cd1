//! Best-effort, non-load-bearing progress display. Wired in as a
//! [`ProgressSink`] so the Sender/Receiver state machines never know
//! whether anything is actually printing.

use std::io::Write;
use std::time::Instant;

use is_terminal::IsTerminal;

use rft_transfer::interact::ProgressSink;

use crate::units::{format_bytes, format_duration_secs, format_rate};

/// Carriage-return-rewinding stdout reporter. Suppressed entirely when
/// stdout is not a tty (e.g. piped output, or the test harness) or when
/// the caller passes `quiet = true`, matching `--quiet`/non-tty detection
/// from SPEC_FULL.md §4.7.
pub struct Reporter {
    enabled: bool,
    phase_start: Instant,
    last_update: Instant,
    last_transferred: u64,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        let enabled = !quiet && std::io::stdout().is_terminal();
        let now = Instant::now();
        Self {
            enabled,
            phase_start: now,
            last_update: now,
            last_transferred: 0,
        }
    }

    /// Start timing a new phase (validation, then tail streaming each get
    /// their own elapsed/ETA clock).
    pub fn reset_phase(&mut self) {
        let now = Instant::now();
        self.phase_start = now;
        self.last_update = now;
        self.last_transferred = 0;
    }

    /// Move past the last progress line so subsequent output (a log line,
    /// the shell prompt) doesn't land on top of it.
    pub fn finish(&self) {
        if self.enabled {
            println!();
        }
    }
}

impl ProgressSink for Reporter {
    fn on_progress(&mut self, transferred: u64, total: u64) {
        if !self.enabled {
            return;
        }

        let now = Instant::now();
        let elapsed = now.duration_since(self.phase_start).as_secs_f64();
        let since_last = now.duration_since(self.last_update).as_secs_f64().max(1e-6);
        let delta = transferred.saturating_sub(self.last_transferred);

        let avg_speed = if elapsed > 0.0 { transferred as f64 / elapsed } else { 0.0 };
        let inst_speed = delta as f64 / since_last;
        let percent = if total > 0 {
            (transferred as f64 / total as f64) * 100.0
        } else {
            100.0
        };
        let remaining = total.saturating_sub(transferred);
        let eta_secs = if avg_speed > 0.0 { remaining as f64 / avg_speed } else { 0.0 };

        print!(
            "\r{} / {}  elapsed {}  avg {}  cur {}  {:5.1}%  ETA {}   ",
            format_bytes(transferred as f64),
            format_bytes(total as f64),
            format_duration_secs(elapsed),
            format_rate(avg_speed),
            format_rate(inst_speed),
            percent,
            format_duration_secs(eta_secs),
        );
        let _ = std::io::stdout().flush();

        self.last_update = now;
        self.last_transferred = transferred;
    }
}
