use crate::pipeline::RunReport;
use crate::ui::progress_message::ProgressMessage;
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

/// Chunk progress bar fed by the pipeline's progress channel.
pub struct ProgressManager {
    chunks: ProgressBar,
    _handle: thread::JoinHandle<()>,
}

impl ProgressManager {
    pub fn new() -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let chunks = if console::Term::stdout().is_term() {
            let pb = ProgressBar::new(0);
            if let Ok(style) =
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} chunks {msg}")
            {
                pb.set_style(style.progress_chars("=> "));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let chunks_clone = chunks.clone();
        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Started { chunks, ids } => {
                        chunks_clone.set_length(chunks as u64);
                        chunks_clone.set_message(format!("({} ids)", ids));
                        chunks_clone.enable_steady_tick(Duration::from_millis(100));
                    }
                    ProgressMessage::ChunkFetched {
                        chunk,
                        fetched,
                        missing,
                    } => {
                        chunks_clone.inc(1);
                        chunks_clone.set_message(format!(
                            "chunk {}: {} people, {} missing",
                            chunk + 1,
                            fetched,
                            missing
                        ));
                    }
                    ProgressMessage::ChunkCommitted { .. } => {}
                    ProgressMessage::PersonSkipped { id, error } => {
                        chunks_clone.println(format!("{} person {}: {}", Icons::SKIP, id, error));
                    }
                    ProgressMessage::Finished => {
                        chunks_clone.finish_with_message("Done");
                        break;
                    }
                }
            }
        });

        (
            Self {
                chunks,
                _handle: handle,
            },
            tx,
        )
    }

    pub fn clear(&self) {
        self.chunks.finish_and_clear();
    }

    pub fn finish_with_summary(&self, report: &RunReport) {
        self.clear();
        println!();
        println!(
            "{} {}",
            Icons::CHECK,
            format!("Synced in {}", HumanDuration(report.elapsed)).style(theme().success.clone())
        );
        println!(
            "  {} {} stored  {} {} not found  {} {} skipped",
            Icons::PERSON.style(theme().info.clone()),
            report.stored,
            Icons::CROSS.style(theme().info.clone()),
            report.not_found.len(),
            Icons::SKIP.style(theme().info.clone()),
            report.skipped.len()
        );
    }
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_message(message.to_string());
        if console::Term::stdout().is_term() {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        Self { pb }
    }

    pub fn finish_with_message(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}
