//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use lookout_core::{QueryField, RecordStore, VisitorFields, VisitorRecord};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{decode_all, encode_document, encode_uuid, RawRecord},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Add a record under a fresh id. The console never writes records; this
  /// backs the server's import path and test fixtures.
  pub async fn insert(
    &self,
    collection: &str,
    fields: VisitorFields,
  ) -> Result<VisitorRecord> {
    fields.validate()?;
    let record = VisitorRecord::new(Uuid::new_v4(), fields);

    let collection = collection.to_owned();
    let id_str = encode_uuid(record.id);
    let document = encode_document(&record.fields)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO records (collection, record_id, document) VALUES (?1, ?2, ?3)",
          rusqlite::params![collection, id_str, document],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  /// Insert many records in one transaction.
  pub async fn insert_batch(
    &self,
    collection: &str,
    batch: Vec<VisitorFields>,
  ) -> Result<Vec<VisitorRecord>> {
    let records = batch
      .into_iter()
      .map(|fields| -> Result<VisitorRecord> {
        fields.validate()?;
        Ok(VisitorRecord::new(Uuid::new_v4(), fields))
      })
      .collect::<Result<Vec<_>>>()?;

    let rows = records
      .iter()
      .map(|r| -> Result<(String, String)> {
        Ok((encode_uuid(r.id), encode_document(&r.fields)?))
      })
      .collect::<Result<Vec<_>>>()?;
    let collection = collection.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO records (collection, record_id, document) VALUES (?1, ?2, ?3)",
          )?;
          for (id, document) in &rows {
            stmt.execute(rusqlite::params![collection, id, document])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(count = records.len(), "inserted records");
    Ok(records)
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn list_all(&self, collection: &str) -> Result<Vec<VisitorRecord>> {
    let collection = collection.to_owned();

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM records WHERE collection = ?1 ORDER BY rowid",
          RawRecord::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![collection], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_all(raws)
  }

  async fn get_by_id(&self, collection: &str, id: Uuid) -> Result<Option<VisitorRecord>> {
    let collection = collection.to_owned();
    let id_str = encode_uuid(id);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM records WHERE collection = ?1 AND record_id = ?2",
          RawRecord::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![collection, id_str], RawRecord::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn query_by_equality(
    &self,
    collection: &str,
    field: QueryField,
    value: &str,
  ) -> Result<Vec<VisitorRecord>> {
    let collection = collection.to_owned();
    let value = value.to_owned();
    let path = field.json_path();

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM records
           WHERE collection = ?1 AND json_extract(document, ?2) = ?3
           ORDER BY rowid",
          RawRecord::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![collection, path, value], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_all(raws)
  }

  async fn batch_delete(&self, collection: &str, ids: &[Uuid]) -> Result<usize> {
    let collection = collection.to_owned();
    let ids: Vec<String> = ids.iter().copied().map(encode_uuid).collect();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut deleted = 0;
        {
          let mut stmt =
            tx.prepare("DELETE FROM records WHERE collection = ?1 AND record_id = ?2")?;
          for id in &ids {
            deleted += stmt.execute(rusqlite::params![collection, id])?;
          }
        }
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    tracing::debug!(deleted, "batch delete committed");
    Ok(deleted)
  }
}
