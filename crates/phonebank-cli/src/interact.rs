//! Terminal collaborators: progress logging and yes/no prompts.

use std::{
  cell::Cell,
  io::{self, BufRead, Write},
};

use phonebank_core::progress::ProgressSink;

/// Logs progress at every 10% step instead of every update. A percentage
/// lower than the previous one starts a new phase and re-arms the steps.
#[derive(Debug, Default)]
pub struct LogProgress {
  next_step: Cell<u8>,
  last:      Cell<f64>,
}

impl ProgressSink for LogProgress {
  fn update(&self, percent: f64, status: &str) {
    let percent = percent.clamp(0.0, 100.0);
    if percent < self.last.get() {
      self.next_step.set(0);
    }
    self.last.set(percent);

    let step = (percent / 10.0).floor() as u8;
    if step >= self.next_step.get() {
      tracing::info!(percent = step * 10, "{status}");
      self.next_step.set(step + 1);
    } else {
      tracing::debug!(percent, "{status}");
    }
  }
}

/// Ask on stdin; anything other than `y`/`yes` declines.
pub fn ask_stdin(prompt: &str) -> bool {
  print!("{prompt} [y/N] ");
  io::stdout().flush().ok();
  let mut line = String::new();
  if io::stdin().lock().read_line(&mut line).is_err() {
    return false;
  }
  is_yes(&line)
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
