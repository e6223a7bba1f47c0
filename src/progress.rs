//! Generation progress reporting.
//!
//! A generation run spends most of its time waiting on the model or sitting
//! in rate-limit pauses. Progress lines on **stderr** show where it is
//! without disturbing the summary printed on stdout.

use std::io::Write;

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Starting document `n` of `total`.
    Document { n: u64, total: u64, file_name: String },
    /// Starting article `n` of `total` within the current document.
    Article { n: u64, total: u64, topic: String },
    /// Pausing between model calls.
    Waiting { millis: u64 },
}

impl ProgressEvent {
    /// Single-line human rendering, without the trailing newline.
    pub fn describe(&self) -> String {
        match self {
            ProgressEvent::Document { n, total, file_name } => {
                format!("[{}/{}] {}", n, total, file_name)
            }
            ProgressEvent::Article { n, total, topic } => {
                format!("    article {}/{}: {}", n, total, topic)
            }
            ProgressEvent::Waiting { millis } => {
                format!("    pausing {:.1}s", *millis as f64 / 1000.0)
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ProgressEvent::Document { n, total, file_name } => serde_json::json!({
                "event": "document",
                "n": n,
                "total": total,
                "file": file_name,
            }),
            ProgressEvent::Article { n, total, topic } => serde_json::json!({
                "event": "article",
                "n": n,
                "total": total,
                "topic": topic,
            }),
            ProgressEvent::Waiting { millis } => serde_json::json!({
                "event": "waiting",
                "millis": millis,
            }),
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-readable lines on stderr.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", event.describe());
        let _ = err.flush();
    }
}

/// One JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", event.to_json());
        let _ = err.flush();
    }
}

pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// `--progress` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// The explicit choice, or `human` when stderr is a terminal and `off`
    /// otherwise.
    pub fn resolve(choice: Option<ProgressMode>) -> Self {
        choice.unwrap_or_else(|| {
            if atty::is(atty::Stream::Stderr) {
                ProgressMode::Human
            } else {
                ProgressMode::Off
            }
        })
    }

    pub fn reporter(self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
