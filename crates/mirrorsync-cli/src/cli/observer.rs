//! Terminal output for `sync`: notices on their own lines, plus a one-line
//! progress summary redrawn in place.

use mirrorsync_core::scheduler::{Notice, PipelineObserver};
use mirrorsync_core::task::TaskRegistry;
use std::io::Write;
use std::time::Instant;

pub struct TerminalObserver {
    started: Instant,
    line_active: bool,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            line_active: false,
        }
    }

    /// End the progress line so later output starts on a fresh line.
    pub fn finish(&mut self) {
        if self.line_active {
            println!();
            self.line_active = false;
        }
    }
}

impl Default for TerminalObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for TerminalObserver {
    fn notice(&mut self, notice: &Notice) {
        // Successful verifications only show up in the progress line.
        if matches!(notice, Notice::Verified { .. }) {
            return;
        }
        self.finish();
        println!("{}", notice);
    }

    fn tick(&mut self, registry: &TaskRegistry) {
        let c = registry.counts();
        let in_flight_mib = registry.bytes_in_flight() as f64 / 1_048_576.0;
        print!(
            "\r  {}/{} verified | {} downloading ({:.1} MiB) | {} verifying | {} queued | {} failed | {:.0}s  ",
            c.verified,
            c.total(),
            c.downloading,
            in_flight_mib,
            c.verifying,
            c.pending + c.downloaded,
            c.failed,
            self.started.elapsed().as_secs_f64()
        );
        let _ = std::io::stdout().flush();
        self.line_active = true;
    }
}
