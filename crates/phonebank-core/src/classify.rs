//! Duplicate classification of an incoming batch.
//!
//! Given normalized numbers in file order and the subset already present in
//! the destination partition, split the batch into what gets inserted, what
//! gets routed to the duplicate-holding partition, and what gets skipped.
//! Nothing here touches storage; membership is looked up by the caller
//! before any of the batch is committed.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A number that occurs more than once in the incoming batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalDuplicate {
  pub phone_number: String,
  /// Occurrences within the batch, first one included.
  pub count:        usize,
}

/// The outcome of [`classify`]. The three groups are disjoint by number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
  /// First occurrence of every number not already stored, in file order.
  pub first_occurrences:   Vec<String>,
  /// Every later occurrence of those numbers, in file order. These are kept
  /// and written to the duplicate-holding partition.
  pub repeats:             Vec<String>,
  /// Distinct repeated numbers with their in-batch count, ordered by first
  /// appearance. Never contains an existing duplicate.
  pub internal_duplicates: Vec<InternalDuplicate>,
  /// Distinct numbers already present in the destination, ordered by first
  /// appearance. None of their occurrences are inserted anywhere.
  pub existing_duplicates: Vec<String>,
  /// Total lines skipped because their number already exists.
  pub existing_occurrences: usize,
}

impl Classification {
  /// Occurrences that will be written somewhere.
  pub fn insertable(&self) -> usize { self.first_occurrences.len() + self.repeats.len() }
}

/// Classify `batch` against the numbers already stored in the destination.
pub fn classify(batch: &[String], existing: &HashSet<String>) -> Classification {
  let mut out = Classification::default();
  let mut seen: HashMap<&str, usize> = HashMap::new();
  // Index into `internal_duplicates` for each repeated number.
  let mut dup_slot: HashMap<&str, usize> = HashMap::new();
  let mut existing_seen: HashSet<&str> = HashSet::new();

  for number in batch {
    if existing.contains(number) {
      out.existing_occurrences += 1;
      if existing_seen.insert(number.as_str()) {
        out.existing_duplicates.push(number.clone());
      }
      continue;
    }

    let count = seen.entry(number.as_str()).or_insert(0);
    *count += 1;
    match *count {
      1 => out.first_occurrences.push(number.clone()),
      n => {
        out.repeats.push(number.clone());
        match dup_slot.get(number.as_str()) {
          Some(&slot) => out.internal_duplicates[slot].count = n,
          None => {
            dup_slot.insert(number.as_str(), out.internal_duplicates.len());
            out.internal_duplicates.push(InternalDuplicate {
              phone_number: number.clone(),
              count:        n,
            });
          }
        }
      }
    }
  }

  out
}

/// Distinct numbers of `batch`, in first-appearance order.
pub fn distinct(batch: &[String]) -> Vec<String> {
  let mut seen = HashSet::new();
  batch
    .iter()
    .filter(|n| seen.insert(n.as_str()))
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn batch(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

  #[test]
  fn repeats_against_empty_destination() {
    let input = batch(&["0811111111", "0811111111", "0822222222"]);
    let c = classify(&input, &HashSet::new());

    assert_eq!(c.first_occurrences, batch(&["0811111111", "0822222222"]));
    assert_eq!(c.repeats, batch(&["0811111111"]));
    assert_eq!(c.internal_duplicates, vec![InternalDuplicate {
      phone_number: "0811111111".into(),
      count:        2,
    }]);
    assert!(c.existing_duplicates.is_empty());
    assert_eq!(c.insertable(), 3);
  }

  #[test]
  fn existing_numbers_are_excluded_entirely() {
    let input = batch(&["0811111111", "0811111111", "0822222222"]);
    let existing: HashSet<String> = ["0822222222".to_string()].into();
    let c = classify(&input, &existing);

    assert_eq!(c.existing_duplicates, batch(&["0822222222"]));
    assert_eq!(c.existing_occurrences, 1);
    assert_eq!(c.first_occurrences, batch(&["0811111111"]));
    assert!(!c.repeats.contains(&"0822222222".to_string()));
  }

  #[test]
  fn repeated_existing_number_is_not_an_internal_duplicate() {
    let input = batch(&["0833333333", "0833333333", "0833333333"]);
    let existing: HashSet<String> = ["0833333333".to_string()].into();
    let c = classify(&input, &existing);

    assert!(c.internal_duplicates.is_empty());
    assert!(c.repeats.is_empty());
    assert!(c.first_occurrences.is_empty());
    assert_eq!(c.existing_duplicates.len(), 1);
    assert_eq!(c.existing_occurrences, 3);
  }

  #[test]
  fn first_occurrence_follows_input_order() {
    let input = batch(&["0899999999", "0811111111", "0899999999", "0811111111", "0899999999"]);
    let c = classify(&input, &HashSet::new());

    assert_eq!(c.first_occurrences, batch(&["0899999999", "0811111111"]));
    assert_eq!(c.repeats, batch(&["0899999999", "0811111111", "0899999999"]));
    assert_eq!(c.internal_duplicates, vec![
      InternalDuplicate { phone_number: "0899999999".into(), count: 3 },
      InternalDuplicate { phone_number: "0811111111".into(), count: 2 },
    ]);
  }

  #[test]
  fn every_occurrence_lands_in_exactly_one_group() {
    let input = batch(&["0811111111", "0822222222", "0811111111", "0833333333", "0822222222"]);
    let existing: HashSet<String> = ["0833333333".to_string()].into();
    let c = classify(&input, &existing);

    assert_eq!(
      c.first_occurrences.len() + c.repeats.len() + c.existing_occurrences,
      input.len()
    );
  }

  #[test]
  fn distinct_keeps_first_appearance_order() {
    let input = batch(&["0822222222", "0811111111", "0822222222"]);
    assert_eq!(distinct(&input), batch(&["0822222222", "0811111111"]));
  }
}
