//! Conversions between domain types and the text stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings; record bodies as
//! compact JSON.

use lookout_core::{VisitorFields, VisitorRecord};
use uuid::Uuid;

use crate::Result;

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_document(fields: &VisitorFields) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

/// Raw strings read directly from a `records` row.
pub struct RawRecord {
  pub record_id: String,
  pub document:  String,
}

impl RawRecord {
  pub const COLUMNS: &'static str = "record_id, document";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { record_id: row.get(0)?, document: row.get(1)? })
  }

  pub fn into_record(self) -> Result<VisitorRecord> {
    let id = decode_uuid(&self.record_id)?;
    let fields: VisitorFields = serde_json::from_str(&self.document)?;
    Ok(VisitorRecord::new(id, fields))
  }
}

pub fn decode_all(raws: Vec<RawRecord>) -> Result<Vec<VisitorRecord>> {
  raws.into_iter().map(RawRecord::into_record).collect()
}
