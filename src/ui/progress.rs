use crate::output::is_quiet;
use crate::ui::progress_message::ProgressMessage;
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

/// Progress bar for a batch of files, fed by worker threads over a channel
pub struct ProgressManager {
    bar: ProgressBar,
    handle: Option<thread::JoinHandle<usize>>,
    failed: usize,
}

impl ProgressManager {
    pub fn new(total_files: usize) -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let bar = if console::Term::stdout().is_term() && !is_quiet() {
            let bar = ProgressBar::new(total_files as u64);
            if let Ok(style) =
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
            {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };

        let bar_clone = bar.clone();
        let handle = thread::spawn(move || {
            let mut failed = 0;
            for msg in rx {
                match msg {
                    ProgressMessage::Analysed { file } => {
                        bar_clone.inc(1);
                        bar_clone.set_message(file);
                    }
                    ProgressMessage::Failed { file, error } => {
                        failed += 1;
                        bar_clone.inc(1);
                        tracing::debug!("Analysis of {} failed: {}", file, error);
                    }
                    ProgressMessage::Finished => break,
                }
            }
            bar_clone.finish_and_clear();
            failed
        });

        (
            Self {
                bar,
                handle: Some(handle),
                failed: 0,
            },
            tx,
        )
    }

    /// Wait for the display thread; returns the number of failed files
    pub fn finish(&mut self) -> usize {
        if let Some(handle) = self.handle.take() {
            self.failed = handle.join().unwrap_or(0);
        }
        self.bar.finish_and_clear();
        self.failed
    }

    pub fn finish_with_summary(&mut self, duration: Duration, files: usize, globals: usize) {
        let failed = self.finish();
        if is_quiet() {
            return;
        }
        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Analysed in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::FILE.style(theme().info.clone()),
            files,
            Icons::GLOBE.style(theme().info.clone()),
            globals,
            Icons::CROSS.style(theme().info.clone()),
            failed
        );
    }
}
