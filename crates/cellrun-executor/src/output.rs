//! Output shaping: truncation and stream splitting.

use tracing::debug;

/// Prefix the container runtime stamps onto every stderr line when it
/// interleaves both streams into one log.
pub const STDERR_MARKER: &str = "[STDERR] ";

/// Appended when output exceeds the configured maximum.
pub const TRUNCATION_MARKER: &str = "\n... [output truncated]";

const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Truncates and classifies captured output.
#[derive(Debug, Clone)]
pub struct OutputCollector {
    max_output_bytes: usize,
}

impl Default for OutputCollector {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl OutputCollector {
    /// Collector with a custom output ceiling in bytes.
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    /// Truncate `raw` to the configured maximum, preserving UTF-8
    /// boundaries, and append the truncation marker if anything was cut.
    pub fn collect(&self, raw: &str) -> String {
        if raw.len() <= self.max_output_bytes {
            return raw.to_string();
        }
        let mut end = self.max_output_bytes;
        while end > 0 && !raw.is_char_boundary(end) {
            end -= 1;
        }
        debug!(
            raw_len = raw.len(),
            kept = end,
            "output truncated to configured maximum"
        );
        let mut truncated = raw[..end].to_string();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    }

    /// Split an interleaved log into (stdout, stderr) by routing lines that
    /// carry the stderr marker prefix.
    pub fn split(&self, raw: &str) -> (String, String) {
        if raw.is_empty() {
            return (String::new(), String::new());
        }
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        for line in raw.lines() {
            match line.strip_prefix(STDERR_MARKER) {
                Some(rest) => stderr.push(rest),
                None => stdout.push(line),
            }
        }
        (stdout.join("\n"), stderr.join("\n"))
    }
}
