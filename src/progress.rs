use std::sync::OnceLock;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::scheduler::ProgressObserver;

/// Ignores all progress notifications
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {
    fn on_progress(&self, _done: usize, _total: usize) {}
}

/// Logs "<label> 500/1234..." lines at info level.
pub struct LogObserver {
    label: String,
}

impl LogObserver {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressObserver for LogObserver {
    fn on_progress(&self, done: usize, total: usize) {
        info!("  {} {}/{}...", self.label, done, total);
    }
}

/// Terminal progress bar, drawn once the batch size is known.
pub struct BarObserver {
    label: String,
    bar: OnceLock<ProgressBar>,
}

impl BarObserver {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bar: OnceLock::new(),
        }
    }

    fn bar(&self, total: usize) -> &ProgressBar {
        self.bar.get_or_init(|| {
            let bar = ProgressBar::new(total as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-");
            bar.set_style(style);
            bar.set_message(self.label.clone());
            bar
        })
    }
}

impl ProgressObserver for BarObserver {
    fn on_progress(&self, done: usize, total: usize) {
        self.bar(total).set_position(done as u64);
    }

    fn on_finish(&self, total: usize) {
        let bar = self.bar(total);
        bar.set_position(total as u64);
        bar.finish();
    }
}

/// How the CLI shows batch progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Bar,
    Log,
    Silent,
}

impl ProgressMode {
    pub fn observer(self, label: &str) -> Box<dyn ProgressObserver> {
        match self {
            ProgressMode::Bar => Box::new(BarObserver::new(label)),
            ProgressMode::Log => Box::new(LogObserver::new(label)),
            ProgressMode::Silent => Box::new(SilentObserver),
        }
    }
}
