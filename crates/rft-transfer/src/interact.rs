//! Narrow seams the transfer state machines call out through, so tests can
//! drive a full Sender/Receiver run without a real terminal or a real
//! progress display.

/// Asks the local operator whether to overwrite data that failed
/// validation. Implementations talk to stdin/stdout; tests supply a fixed
/// answer.
pub trait OverwritePrompt {
    fn confirm_overwrite(&mut self) -> std::io::Result<bool>;
}

/// Prompts on the real controlling terminal.
pub struct StdinPrompt;

impl OverwritePrompt for StdinPrompt {
    fn confirm_overwrite(&mut self) -> std::io::Result<bool> {
        use std::io::Write;
        print!("Do you want to overwrite the existed data that does match with remove file? (y/n) ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// Always answers the same way. Used by tests and by any caller that
/// wants non-interactive behavior.
pub struct FixedAnswer(pub bool);

impl OverwritePrompt for FixedAnswer {
    fn confirm_overwrite(&mut self) -> std::io::Result<bool> {
        Ok(self.0)
    }
}

/// Receives byte-progress updates during validation and tail streaming.
/// Purely observational: a no-op implementation changes nothing about
/// correctness.
pub trait ProgressSink {
    fn on_progress(&mut self, transferred: u64, total: u64);
}

/// Discards every update. Used where no interactive display is wanted.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_progress(&mut self, _transferred: u64, _total: u64) {}
}

impl<F: FnMut(u64, u64)> ProgressSink for F {
    fn on_progress(&mut self, transferred: u64, total: u64) {
        self(transferred, total)
    }
}
