//! A minimal, single-threaded diagnostics journal. Every fallible builder
//! (`LexiconBuilder`, `Syntactic::Builder`, `Grammar::compile`) accepts a
//! `&mut Journal` that collects non-fatal notices alongside whatever fatal
//! error it may ultimately return.
//!
//! Unlike the `Arc<RwLock<..>>` scratch-pad split this is descended from,
//! there is no cross-thread sharing to account for here (§5): a single
//! owned [`Report`] is enough.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
  Trace,
  Info,
  Warning,
  Error,
}

#[derive(Clone, Debug)]
pub struct ReportEntry {
  pub severity: Severity,
  pub label:    String,
  pub message:  String,
  pub at:       Instant,
}

/// An ordered list of named, timestamped entries produced during a single
/// build or parse.
#[derive(Debug, Default)]
pub struct Report {
  entries: Vec<ReportEntry>,
}

impl Report {
  pub fn entries(&self) -> &[ReportEntry] {
    &self.entries
  }

  pub fn push(&mut self, severity: Severity, label: impl Into<String>, message: impl Into<String>, at: Instant) {
    self.entries.push(ReportEntry { severity, label: label.into(), message: message.into(), at });
  }

  pub fn error_count(&self) -> usize {
    self.entries.iter().filter(|e| e.severity == Severity::Error).count()
  }
}

/// A label plus a start/stop [`Instant`] pair, used to bound build phases
/// such as "nullable", "first", "follow", or "states".
#[derive(Debug)]
pub struct Timing {
  label: &'static str,
  start: Instant,
  stop:  Option<Instant>,
}

impl Timing {
  pub fn label(&self) -> &'static str {
    self.label
  }

  /// `None` while the phase is still running.
  pub fn elapsed(&self) -> Option<Duration> {
    self.stop.map(|stop| stop.duration_since(self.start))
  }
}

/// Guard returned by [`Journal::time`]. Stops the timing on drop so callers
/// cannot forget to close a phase, mirroring the teacher's `start_timer` /
/// `stop_timer` pair without needing an explicit matching call.
pub struct TimingGuard<'j> {
  journal: &'j mut Journal,
  index:   usize,
}

impl<'j> Drop for TimingGuard<'j> {
  fn drop(&mut self) {
    if let Some(timing) = self.journal.timings.get_mut(self.index) {
      if timing.stop.is_none() {
        timing.stop = Some(Instant::now());
      }
    }
  }
}

/// Collects the [`Report`] and [`Timing`] data for a single build or parse.
#[derive(Debug)]
pub struct Journal {
  report:      Report,
  timings:     Vec<Timing>,
  create_time: Instant,
}

impl Default for Journal {
  fn default() -> Self {
    Self::new()
  }
}

impl Journal {
  pub fn new() -> Self {
    Self { report: Report::default(), timings: Vec::new(), create_time: Instant::now() }
  }

  pub fn report(&self) -> &Report {
    &self.report
  }

  pub fn report_mut(&mut self) -> &mut Report {
    &mut self.report
  }

  pub fn error_count(&self) -> usize {
    self.report.error_count()
  }

  pub fn note(&mut self, severity: Severity, label: impl Into<String>, message: impl Into<String>) {
    self.report.push(severity, label, message, Instant::now());
  }

  /// Starts a named timing phase and returns a guard that stops it on drop.
  pub fn time(&mut self, label: &'static str) -> TimingGuard<'_> {
    let index = self.timings.len();
    self.timings.push(Timing { label, start: Instant::now(), stop: None });
    TimingGuard { journal: self, index }
  }

  pub fn timings(&self) -> &[Timing] {
    &self.timings
  }

  pub fn create_time(&self) -> Instant {
    self.create_time
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn note_increments_error_count_only_for_errors() {
    let mut j = Journal::new();
    j.note(Severity::Trace, "nullable", "S is nullable");
    j.note(Severity::Error, "first", "empty FIRST set for S");
    assert_eq!(j.error_count(), 1);
    assert_eq!(j.report().entries().len(), 2);
  }

  #[test]
  fn timing_guard_stops_on_drop() {
    let mut j = Journal::new();
    {
      let _guard = j.time("states");
    }
    assert!(j.timings()[0].elapsed().is_some());
  }
}
