//! Dashboard aggregates over a record snapshot.

use std::{collections::HashMap, fmt};

use serde::{Serialize, Serializer};

use crate::record::VisitorRecord;

// ─── Bucket ──────────────────────────────────────────────────────────────────

/// A tally label. Missing or blank labels land in [`Bucket::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bucket {
  Known(String),
  Unknown,
}

impl Bucket {
  pub fn from_label(label: &str) -> Self {
    let label = label.trim();
    if label.is_empty() { Self::Unknown } else { Self::Known(label.to_owned()) }
  }
}

impl fmt::Display for Bucket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Known(label) => f.write_str(label),
      Self::Unknown => f.write_str("Unknown"),
    }
  }
}

impl Serialize for Bucket {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

// ─── Tally ───────────────────────────────────────────────────────────────────

/// Running count per bucket, kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Tally {
  entries: Vec<(Bucket, usize)>,
  index:   HashMap<Bucket, usize>,
}

impl Tally {
  pub fn add(&mut self, bucket: Bucket) {
    match self.index.get(&bucket) {
      Some(&i) => self.entries[i].1 += 1,
      None => {
        self.index.insert(bucket.clone(), self.entries.len());
        self.entries.push((bucket, 1));
      }
    }
  }

  pub fn get(&self, bucket: &Bucket) -> usize {
    self.index.get(bucket).map_or(0, |&i| self.entries[i].1)
  }

  pub fn entries(&self) -> &[(Bucket, usize)] { &self.entries }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[derive(Serialize)]
struct Entry<'a> {
  label: &'a Bucket,
  value: usize,
}

impl Serialize for Tally {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(
      self.entries.iter().map(|(label, value)| Entry { label, value: *value }),
    )
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Chart inputs for the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub total:     usize,
  pub vpn:       usize,
  pub no_vpn:    usize,
  pub incognito: usize,
  pub regular:   usize,
  pub browsers:  Tally,
  pub countries: Tally,
  pub cities:    Tally,
}

/// Walk `records` once and count every category.
pub fn summarize<'r>(records: impl IntoIterator<Item = &'r VisitorRecord>) -> Summary {
  let mut summary = Summary::default();
  for record in records {
    summary.total += 1;

    if record.is_vpn() {
      summary.vpn += 1;
    } else {
      summary.no_vpn += 1;
    }
    if record.is_incognito() {
      summary.incognito += 1;
    } else {
      summary.regular += 1;
    }

    summary.browsers.add(Bucket::from_label(record.browser()));
    summary.countries.add(Bucket::from_label(record.country()));
    summary.cities.add(Bucket::from_label(record.city()));
  }
  summary
}
