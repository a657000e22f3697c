//! Visitor records: the unit entity held in the record store.
//!
//! A record is one fingerprinted visit. The same `visitor_id` appears on many
//! records when a client returns; `id` is assigned by the store and is the
//! only unique key.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Rendered in place of any absent or empty value.
pub const NOT_AVAILABLE: &str = "N/A";

// ─── Sub-objects ─────────────────────────────────────────────────────────────

/// Where the visit came from, as resolved from the client IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
  pub ip:      String,
  pub city:    String,
  pub country: String,
  pub region:  String,
  /// Organisation owning the IP block.
  pub org:     String,
}

/// Media and rendering capabilities reported by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceInfo {
  pub has_audio:         bool,
  pub has_video:         bool,
  pub platform:          String,
  pub screen_resolution: String,
  pub webgl_renderer:    String,
}

/// Anonymisation signals detected for the visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
  pub vpn:       bool,
  pub proxy:     bool,
  pub tor:       bool,
  pub incognito: bool,
}

/// Autonomous-system data for the client IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Network {
  pub as_org:    String,
  pub as_number: String,
  pub network:   String,
}

// ─── VisitorFields ───────────────────────────────────────────────────────────

/// Everything about a visit except its store-assigned id. This is the
/// document body persisted by a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorFields {
  pub visitor_id:       String,
  #[serde(default)]
  pub location:         Location,
  #[serde(default)]
  pub browser:          String,
  /// Unix timestamp in seconds.
  pub created_at:       i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub device_info:      Option<DeviceInfo>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub security:         Option<Security>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub network:          Option<Network>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confidence_score: Option<f64>,
}

impl VisitorFields {
  /// Reject documents that would break record invariants.
  pub fn validate(&self) -> Result<()> {
    if self.created_at < 0 {
      return Err(Error::NegativeTimestamp(self.created_at));
    }
    Ok(())
  }

  /// Parse a JSON array of documents, as produced by the ingestion side.
  /// Any `id` keys present are ignored; the store assigns its own.
  pub fn parse_batch(json: &str) -> Result<Vec<Self>> {
    let docs: Vec<Self> = serde_json::from_str(json)?;
    docs.iter().try_for_each(Self::validate)?;
    Ok(docs)
  }
}

// ─── VisitorRecord ───────────────────────────────────────────────────────────

/// A stored visit: the document fields plus the id the store gave them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitorRecord {
  pub id:     Uuid,
  #[serde(flatten)]
  pub fields: VisitorFields,
}

impl VisitorRecord {
  pub fn new(id: Uuid, fields: VisitorFields) -> Self { Self { id, fields } }

  pub fn visitor_id(&self) -> &str { &self.fields.visitor_id }

  pub fn ip(&self) -> &str { &self.fields.location.ip }

  pub fn city(&self) -> &str { &self.fields.location.city }

  pub fn country(&self) -> &str { &self.fields.location.country }

  pub fn browser(&self) -> &str { &self.fields.browser }

  pub fn created_at(&self) -> i64 { self.fields.created_at }

  /// `createdAt` in the local timezone, or `None` if out of range.
  pub fn created_at_local(&self) -> Option<DateTime<Local>> {
    DateTime::from_timestamp(self.fields.created_at, 0)
      .map(|dt| dt.with_timezone(&Local))
  }

  /// `"city, country"` as shown in the record list.
  pub fn city_country(&self) -> String {
    format!(
      "{}, {}",
      or_na(&self.fields.location.city),
      or_na(&self.fields.location.country)
    )
  }

  /// Audio/video capability labels; absent device info reads as neither.
  pub fn device_labels(&self) -> (&'static str, &'static str) {
    let info = self.fields.device_info.as_ref();
    let audio = if info.is_some_and(|d| d.has_audio) { "Audio" } else { "No Audio" };
    let video = if info.is_some_and(|d| d.has_video) { "Video" } else { "No Video" };
    (audio, video)
  }

  pub fn is_vpn(&self) -> bool { self.fields.security.is_some_and(|s| s.vpn) }

  pub fn is_incognito(&self) -> bool {
    self.fields.security.is_some_and(|s| s.incognito)
  }
}

/// `value` unless it is blank, in which case [`NOT_AVAILABLE`].
pub fn or_na(value: &str) -> &str {
  if value.trim().is_empty() { NOT_AVAILABLE } else { value }
}

/// `"Yes"`/`"No"` for a flag.
pub fn yes_no(flag: bool) -> &'static str { if flag { "Yes" } else { "No" } }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserialises_wire_document_with_missing_sub_objects() {
    let json = serde_json::json!({
      "id": "6f1c1c62-9a43-4f5e-9c53-0f8b9b1d2a10",
      "visitorId": "715f1cc3ae0c3",
      "location": { "ip": "20.178.152.1", "city": "Riyadh", "country": "SA" },
      "browser": "Chrome",
      "createdAt": 1_708_681_195
    });
    let record: VisitorRecord = serde_json::from_value(json).unwrap();

    assert_eq!(record.visitor_id(), "715f1cc3ae0c3");
    assert_eq!(record.fields.location.region, "");
    assert!(record.fields.security.is_none());
    assert!(!record.is_vpn());
    assert_eq!(record.device_labels(), ("No Audio", "No Video"));
  }

  #[test]
  fn serialises_camel_case_and_flattens_fields() {
    let record = VisitorRecord::new(Uuid::nil(), VisitorFields {
      visitor_id: "abc".into(),
      created_at: 10,
      device_info: Some(DeviceInfo { has_audio: true, ..Default::default() }),
      ..Default::default()
    });
    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["visitorId"], "abc");
    assert_eq!(value["createdAt"], 10);
    assert_eq!(value["deviceInfo"]["hasAudio"], true);
    assert!(value.get("security").is_none());
  }

  #[test]
  fn parse_batch_rejects_negative_timestamps() {
    let ok = r#"[{"visitorId":"a","createdAt":1},{"visitorId":"b","createdAt":2}]"#;
    assert_eq!(VisitorFields::parse_batch(ok).unwrap().len(), 2);

    let bad = r#"[{"visitorId":"a","createdAt":-5}]"#;
    assert!(matches!(
      VisitorFields::parse_batch(bad),
      Err(Error::NegativeTimestamp(-5))
    ));
  }

  #[test]
  fn blank_values_render_as_not_available() {
    assert_eq!(or_na(""), NOT_AVAILABLE);
    assert_eq!(or_na("  "), NOT_AVAILABLE);
    assert_eq!(or_na("Miami"), "Miami");

    let record = VisitorRecord::new(Uuid::nil(), VisitorFields {
      location: Location { city: "Miami".into(), ..Default::default() },
      ..Default::default()
    });
    assert_eq!(record.city_country(), "Miami, N/A");
  }
}
