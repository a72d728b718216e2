//! Phone-number normalization.
//!
//! Turns one raw text line into the canonical `0` + nine digits form, or
//! rejects it. Total and side-effect free.

/// Length of a canonical number, leading `0` included.
pub const CANONICAL_LEN: usize = 10;

/// Normalize a raw line into a canonical phone number.
///
/// 1. Drop every character that is neither an ASCII digit nor `+`.
/// 2. A leading `+66` or `66` country code becomes a single `0`.
/// 3. Anything else not starting with `0` keeps its last nine characters
///    behind a new leading `0`.
/// 4. The result must be exactly `0` followed by nine digits.
pub fn normalize(raw: &str) -> Option<String> {
  let kept: String = raw
    .chars()
    .filter(|c| c.is_ascii_digit() || *c == '+')
    .collect();

  let candidate = if let Some(rest) = kept.strip_prefix("+66") {
    format!("0{rest}")
  } else if let Some(rest) = kept.strip_prefix("66") {
    format!("0{rest}")
  } else if kept.starts_with('0') {
    kept
  } else {
    // Only ASCII is left, so byte slicing stays on char boundaries.
    let tail = &kept[kept.len().saturating_sub(CANONICAL_LEN - 1)..];
    format!("0{tail}")
  };

  is_canonical(&candidate).then_some(candidate)
}

/// True when `s` is exactly `0` followed by nine ASCII digits.
pub fn is_canonical(s: &str) -> bool {
  s.len() == CANONICAL_LEN
    && s.starts_with('0')
    && s.bytes().all(|b| b.is_ascii_digit())
}
