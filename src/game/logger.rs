//! Append-only match event log
//!
//! Every entry carries a verbosity level and a category so tests and tools can
//! filter (e.g. all `Rejected` entries). Formatting of console lines goes
//! through a bump allocator that is reset after each line.

use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::ops::Deref;

/// Verbosity level for match output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// No output
    Silent = 0,
    /// Only turn headers and game results
    Minimal = 1,
    /// Plays, resolutions, combat and scoring
    #[default]
    Normal = 2,
    /// Per-clause traces, priority passes, payments
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    Stdout,
    /// Capture only to in-memory buffer (default for matches, so the event
    /// log is always available)
    #[default]
    Memory,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    Event,
    Phase,
    Chain,
    Combat,
    Decision,
    Payment,
    /// An intent was refused; state unchanged
    Rejected,
    /// A chain item lost its targets and did nothing
    Fizzle,
    /// Ability text the engine has no handler for
    Unsupported,
}

impl LogCategory {
    pub fn tag(&self) -> &'static str {
        match self {
            LogCategory::Event => "event",
            LogCategory::Phase => "phase",
            LogCategory::Chain => "chain",
            LogCategory::Combat => "combat",
            LogCategory::Decision => "decision",
            LogCategory::Payment => "payment",
            LogCategory::Rejected => "rejected",
            LogCategory::Fizzle => "fizzle",
            LogCategory::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub category: LogCategory,
    pub message: String,
}

/// Guard type that provides read-only access to log entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,

    /// Scratch space for console line formatting, reset after each line
    format_bump: RefCell<Bump>,

    log_buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            output_mode: OutputMode::default(),
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Get access to captured log entries
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    /// Clone the entries of one category
    pub fn entries(&self, category: LogCategory) -> Vec<LogEntry> {
        self.log_buffer
            .borrow()
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    pub fn count(&self, category: LogCategory) -> usize {
        self.log_buffer.borrow().iter().filter(|e| e.category == category).count()
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.borrow_mut().clear();
        self.format_bump.borrow_mut().reset();
    }

    /// Print buffered entries (respecting verbosity) and clear the buffer
    pub fn flush_buffer(&mut self) {
        let buffer = self.log_buffer.borrow();
        for entry in buffer.iter() {
            if entry.level <= self.verbosity {
                self.log_to_stdout(entry);
            }
        }
        drop(buffer);
        self.clear_logs();
    }

    /// Print only the last `tail_lines` entries, then clear the buffer
    pub fn flush_tail(&mut self, tail_lines: usize) {
        let buffer = self.log_buffer.borrow();
        let total_lines = buffer.len();
        let start_idx = total_lines.saturating_sub(tail_lines);
        if start_idx > 0 {
            println!(
                ">>> {} LOG LINES ELIDED. PRINTING LAST {} LINES <<<",
                start_idx, tail_lines
            );
        }
        for entry in buffer.iter().skip(start_idx) {
            if entry.level <= self.verbosity {
                self.log_to_stdout(entry);
            }
        }
        drop(buffer);
        self.clear_logs();
    }

    fn log_to_stdout(&self, entry: &LogEntry) {
        {
            let bump = self.format_bump.borrow();
            let indent = if entry.level == VerbosityLevel::Minimal { "" } else { "  " };
            let line = bumpalo::format!(in &*bump, "{}[{}] {}", indent, entry.category.tag(), entry.message);
            println!("{}", line);
        }
        self.format_bump.borrow_mut().reset();
    }

    /// Record an entry; Silent entries are dropped
    pub fn log(&self, level: VerbosityLevel, category: LogCategory, message: &str) {
        if level == VerbosityLevel::Silent {
            return;
        }
        let should_capture = self.is_capturing();
        let should_output = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both);

        if level > self.verbosity && !should_capture {
            return;
        }

        let entry = LogEntry {
            level,
            category,
            message: message.to_string(),
        };

        if should_output && level <= self.verbosity {
            self.log_to_stdout(&entry);
        }
        if should_capture {
            self.log_buffer.borrow_mut().push(entry);
        }
    }

    pub fn minimal(&self, category: LogCategory, message: &str) {
        self.log(VerbosityLevel::Minimal, category, message);
    }

    pub fn normal(&self, category: LogCategory, message: &str) {
        self.log(VerbosityLevel::Normal, category, message);
    }

    pub fn verbose(&self, category: LogCategory, message: &str) {
        self.log(VerbosityLevel::Verbose, category, message);
    }

    pub fn event(&self, message: &str) {
        self.normal(LogCategory::Event, message);
    }

    pub fn rejected(&self, message: &str) {
        self.normal(LogCategory::Rejected, message);
    }

    pub fn fizzle(&self, message: &str) {
        self.normal(LogCategory::Fizzle, message);
    }

    pub fn unsupported(&self, message: &str) {
        self.normal(LogCategory::Unsupported, message);
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .finish()
    }
}

/// Clones carry the captured entries along: a match clone must keep its
/// event log so that a committed clone does not lose history.
impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
            format_bump: RefCell::new(Bump::new()),
            log_buffer: RefCell::new(self.log_buffer.borrow().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capturing_logger() -> GameLogger {
        let mut logger = GameLogger::new();
        logger.set_output_mode(OutputMode::Memory);
        logger
    }

    #[test]
    fn test_logger_creation() {
        let logger = GameLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
        assert!(logger.is_capturing());
    }

    #[test]
    fn test_log_capture_with_categories() {
        let logger = capturing_logger();
        logger.event("Alice plays Daring Poro");
        logger.rejected("Bob cannot pass: not holding priority");
        logger.verbose(LogCategory::Chain, "priority -> Alice");

        let logs = logger.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].category, LogCategory::Event);
        assert_eq!(logs[1].message, "Bob cannot pass: not holding priority");
        assert_eq!(logs[2].level, VerbosityLevel::Verbose);
        drop(logs);

        assert_eq!(logger.count(LogCategory::Rejected), 1);
        assert_eq!(logger.entries(LogCategory::Chain).len(), 1);
    }

    #[test]
    fn test_silent_entries_are_dropped() {
        let logger = capturing_logger();
        logger.log(VerbosityLevel::Silent, LogCategory::Event, "never");
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_clone_keeps_history() {
        let logger = capturing_logger();
        logger.event("first");
        let copy = logger.clone();
        copy.event("second");
        assert_eq!(logger.logs().len(), 1);
        assert_eq!(copy.logs().len(), 2);
    }

    #[test]
    fn test_flush_buffer_clears() {
        let mut logger = GameLogger::with_verbosity(VerbosityLevel::Silent);
        logger.set_output_mode(OutputMode::Memory);
        logger.event("message 1");
        logger.event("message 2");
        assert_eq!(logger.logs().len(), 2);
        logger.flush_buffer();
        assert_eq!(logger.logs().len(), 0);
    }
}
