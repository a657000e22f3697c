//! Single-visitor detail view.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  record::{VisitorRecord, or_na, yes_no},
  store::{QueryField, RecordStore},
};

/// The result of looking up one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Profile {
  Found {
    record: VisitorRecord,
    /// Records in the store sharing this record's `visitorId`.
    visits: usize,
  },
  /// The id does not exist; rendered as a placeholder, not an error.
  NoData,
}

/// Look up `id` and count the visitor's visits.
///
/// A failed visit count is logged and reported as zero; only a failed record
/// lookup is an error.
pub async fn load<S: RecordStore>(
  store: &S,
  collection: &str,
  id: Uuid,
) -> Result<Profile, S::Error> {
  let Some(record) = store.get_by_id(collection, id).await? else {
    return Ok(Profile::NoData);
  };

  let visits = match store
    .query_by_equality(collection, QueryField::VisitorId, record.visitor_id())
    .await
  {
    Ok(matches) => matches.len(),
    Err(e) => {
      tracing::warn!(%id, error = %e, "failed to count visits");
      0
    }
  };

  Ok(Profile::Found { record, visits })
}

// ─── Sections ────────────────────────────────────────────────────────────────

/// A titled group of label/value pairs on the detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
  pub title:  &'static str,
  pub fields: Vec<(&'static str, String)>,
}

/// The detail screen's sections for `record`. Empty values read `N/A`.
pub fn sections(record: &VisitorRecord, visits: usize) -> Vec<Section> {
  let f = &record.fields;
  let loc = &f.location;
  let security = f.security.unwrap_or_default();
  let network = f.network.clone().unwrap_or_default();
  let device = f.device_info.clone().unwrap_or_default();

  let country = if loc.country.trim().is_empty() { &loc.region } else { &loc.country };
  let confidence = f
    .confidence_score
    .map(|s| format!("{s:.2}"))
    .unwrap_or_else(|| or_na("").to_owned());

  fn text(v: &str) -> String { or_na(v).to_owned() }

  vec![
    Section {
      title:  "Basic Information",
      fields: vec![
        ("Fingerprint", text(&f.visitor_id)),
        ("IP Address", text(&loc.ip)),
        ("Browser", text(&f.browser)),
        ("Total Visits", visits.to_string()),
        ("City", text(&loc.city)),
        ("Country", text(country)),
        ("Region", text(&loc.region)),
        ("Organization", text(&loc.org)),
        ("Confidence Score", confidence),
      ],
    },
    Section {
      title:  "Security Information",
      fields: vec![
        ("Incognito Mode", yes_no(security.incognito).to_owned()),
        ("VPN Usage", yes_no(security.vpn).to_owned()),
        ("Proxy", yes_no(security.proxy).to_owned()),
        ("Tor Usage", yes_no(security.tor).to_owned()),
      ],
    },
    Section {
      title:  "Network Information",
      fields: vec![
        ("Autonomous System Organization", text(&network.as_org)),
        ("Autonomous System Number", text(&network.as_number)),
        ("Network", text(&network.network)),
      ],
    },
    Section {
      title:  "Device Information",
      fields: vec![
        ("Has Audio", yes_no(device.has_audio).to_owned()),
        ("Has Video", yes_no(device.has_video).to_owned()),
        ("Platform", text(&device.platform)),
        ("Screen Resolution", text(&device.screen_resolution)),
        ("WebGL Renderer", text(&device.webgl_renderer)),
      ],
    },
  ]
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use crate::record::{Location, Security, VisitorFields};

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("query failed")]
  struct QueryFailed;

  struct Fixed {
    records:     Mutex<Vec<VisitorRecord>>,
    fail_query:  bool,
  }

  impl RecordStore for Fixed {
    type Error = QueryFailed;

    async fn list_all(&self, _: &str) -> Result<Vec<VisitorRecord>, QueryFailed> {
      Ok(self.records.lock().unwrap().clone())
    }

    async fn get_by_id(&self, _: &str, id: Uuid) -> Result<Option<VisitorRecord>, QueryFailed> {
      Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn query_by_equality(
      &self,
      _: &str,
      field: QueryField,
      value: &str,
    ) -> Result<Vec<VisitorRecord>, QueryFailed> {
      if self.fail_query {
        return Err(QueryFailed);
      }
      let records = self.records.lock().unwrap();
      Ok(records.iter().filter(|r| field.value_of(r) == value).cloned().collect())
    }

    async fn batch_delete(&self, _: &str, _: &[Uuid]) -> Result<usize, QueryFailed> {
      Ok(0)
    }
  }

  fn visit(n: u128, visitor_id: &str) -> VisitorRecord {
    VisitorRecord::new(Uuid::from_u128(n), VisitorFields {
      visitor_id: visitor_id.into(),
      ..Default::default()
    })
  }

  fn store(fail_query: bool) -> Fixed {
    Fixed {
      records: Mutex::new(vec![visit(1, "a"), visit(2, "b"), visit(3, "a")]),
      fail_query,
    }
  }

  #[tokio::test]
  async fn counts_visits_sharing_visitor_id() {
    let profile = load(&store(false), "Users", Uuid::from_u128(3)).await.unwrap();
    match profile {
      Profile::Found { record, visits } => {
        assert_eq!(record.visitor_id(), "a");
        assert_eq!(visits, 2);
      }
      Profile::NoData => panic!("expected a record"),
    }
  }

  #[tokio::test]
  async fn missing_record_is_no_data() {
    let profile = load(&store(false), "Users", Uuid::from_u128(42)).await.unwrap();
    assert_eq!(profile, Profile::NoData);
  }

  #[tokio::test]
  async fn failed_visit_count_reads_zero() {
    let profile = load(&store(true), "Users", Uuid::from_u128(1)).await.unwrap();
    assert!(matches!(profile, Profile::Found { visits: 0, .. }));
  }

  #[test]
  fn sections_fill_not_available_and_fall_back_to_region() {
    let record = VisitorRecord::new(Uuid::nil(), VisitorFields {
      visitor_id: "fp".into(),
      location: Location { region: "Florida".into(), ..Default::default() },
      security: Some(Security { tor: true, ..Default::default() }),
      confidence_score: Some(0.987),
      ..Default::default()
    });

    let s = sections(&record, 4);
    let basic = &s[0].fields;
    let lookup = |label: &str| basic.iter().find(|(l, _)| *l == label).unwrap().1.clone();

    assert_eq!(lookup("Country"), "Florida");
    assert_eq!(lookup("City"), "N/A");
    assert_eq!(lookup("Total Visits"), "4");
    assert_eq!(lookup("Confidence Score"), "0.99");
    assert!(s[1].fields.contains(&("Tor Usage", "Yes".to_owned())));
    assert!(s[2].fields.iter().all(|(_, v)| v == "N/A"));
  }

  #[test]
  fn profile_serialises_with_status_tag() {
    let json = serde_json::to_value(Profile::NoData).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "no_data" }));
  }
}
