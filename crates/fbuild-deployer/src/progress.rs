//! Best-effort progress scraping from transfer tool output.

use regex::Regex;
use std::sync::LazyLock;

/// Extracts a completion percentage from a chunk of subprocess output.
pub trait ProgressParser: Send + Sync {
    /// The most recent percentage in `chunk`, if any.
    fn parse(&self, chunk: &str) -> Option<u8>;
}

static PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})(?:\.\d+)?\s?%").unwrap());

/// Matches `NN%` anywhere in the output and keeps the last one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentParser;

impl ProgressParser for PercentParser {
    fn parse(&self, chunk: &str) -> Option<u8> {
        PERCENT_REGEX
            .captures_iter(chunk)
            .filter_map(|caps| caps[1].parse::<u16>().ok())
            .last()
            .map(|p| p.min(100) as u8)
    }
}

/// Longest unterminated tail kept between reads.
const MAX_PENDING: usize = 64 * 1024;

/// Joins output chunks back into whole redraws.
///
/// Transfer tools end each progress redraw with `\r` or `\n`, but a read can
/// stop anywhere inside one. Only text up to the last terminator is released;
/// the rest waits for the next chunk.
#[derive(Debug, Default)]
pub struct RedrawBuffer {
    pending: String,
}

impl RedrawBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and take every complete redraw seen so far.
    pub fn push(&mut self, chunk: &str) -> String {
        self.pending.push_str(chunk);
        match self.pending.rfind(['\r', '\n']) {
            Some(end) => {
                let tail = self.pending.split_off(end + 1);
                std::mem::replace(&mut self.pending, tail)
            }
            None if self.pending.len() > MAX_PENDING => std::mem::take(&mut self.pending),
            None => String::new(),
        }
    }

    /// Take whatever is left once the stream has closed.
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }
}

/// For back ends that report nothing useful.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressParser for NoProgress {
    fn parse(&self, _chunk: &str) -> Option<u8> {
        None
    }
}
