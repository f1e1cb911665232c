//! LanceDB vector index over assembled contracts.
//!
//! One `contracts` table holds an embedding per contract plus the flat
//! metadata consumers need back from a similarity hit. Adds are upserts:
//! any existing row with the same id is deleted before the new row is
//! appended, so re-indexing a re-parsed contract never duplicates it.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, FixedSizeListBuilder, Float32Array, Float32Builder, LargeStringArray,
    RecordBatchIterator, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use serde_json::Value;
use tracing::info;

use crate::StoreError;

const CONTRACTS_TABLE: &str = "contracts";

/// Row to index: contract id, optional supplier, embedding, and the
/// metadata payload stored alongside (serialized to a JSON column).
#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub id: String,
    pub supplier: Option<String>,
    pub embedding: Vec<f32>,
    pub metadata: Value,
}

/// Row read back from the index. `distance` is populated only by vector
/// queries, not by id or supplier lookups.
#[derive(Debug, Clone)]
pub struct StoredContract {
    pub id: String,
    pub supplier: Option<String>,
    pub metadata: Value,
    pub distance: Option<f32>,
}

/// Vector index for contract similarity search.
pub struct ContractIndex {
    db: lancedb::Connection,
    dim: usize,
}

impl ContractIndex {
    /// Connect to a LanceDB database at the given path.
    ///
    /// Creates the database directory if it doesn't exist; the table
    /// itself is created lazily on the first `add`.
    pub async fn open(path: &Path, dim: usize) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        Ok(Self { db, dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Upsert one contract row.
    pub async fn add(&self, record: IndexRecord) -> Result<(), StoreError> {
        if record.embedding.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                got: record.embedding.len(),
                want: self.dim,
            });
        }

        let batch = self.build_batch(&record)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);

        match self.table().await? {
            Some(table) => {
                table
                    .delete(&format!("id = '{}'", sql_quote(&record.id)))
                    .await?;
                table.add(Box::new(reader)).execute().await?;
            }
            None => {
                self.db
                    .create_table(CONTRACTS_TABLE, Box::new(reader))
                    .execute()
                    .await?;
            }
        }
        info!(id = %record.id, "indexed contract");
        Ok(())
    }

    /// Nearest `k` contracts to the query embedding, closest first.
    pub async fn query(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<StoredContract>, StoreError> {
        if embedding.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                got: embedding.len(),
                want: self.dim,
            });
        }
        let Some(table) = self.table().await? else {
            return Ok(Vec::new());
        };
        let batches: Vec<RecordBatch> = table
            .vector_search(embedding)?
            .limit(k)
            .execute()
            .await?
            .try_collect()
            .await?;
        contracts_from_batches(&batches)
    }

    /// Look up one contract by id.
    pub async fn get(&self, id: &str) -> Result<Option<StoredContract>, StoreError> {
        let Some(table) = self.table().await? else {
            return Ok(None);
        };
        let batches: Vec<RecordBatch> = table
            .query()
            .only_if(format!("id = '{}'", sql_quote(id)))
            .limit(1)
            .execute()
            .await?
            .try_collect()
            .await?;
        Ok(contracts_from_batches(&batches)?.pop())
    }

    /// All indexed contracts for one supplier.
    pub async fn supplier(&self, name: &str) -> Result<Vec<StoredContract>, StoreError> {
        let Some(table) = self.table().await? else {
            return Ok(Vec::new());
        };
        let total = table.count_rows(None).await?;
        if total == 0 {
            return Ok(Vec::new());
        }
        let batches: Vec<RecordBatch> = table
            .query()
            .only_if(format!("supplier = '{}'", sql_quote(name)))
            .limit(total)
            .execute()
            .await?
            .try_collect()
            .await?;
        contracts_from_batches(&batches)
    }

    /// Remove one contract; removing an absent id is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if let Some(table) = self.table().await? {
            table.delete(&format!("id = '{}'", sql_quote(id))).await?;
        }
        Ok(())
    }

    /// Number of indexed contracts.
    pub async fn count(&self) -> Result<usize, StoreError> {
        match self.table().await? {
            Some(table) => Ok(table.count_rows(None).await?),
            None => Ok(0),
        }
    }

    // ── Internal ──

    async fn table(&self) -> Result<Option<lancedb::Table>, StoreError> {
        let names = self.db.table_names().execute().await?;
        if !names.contains(&CONTRACTS_TABLE.to_string()) {
            return Ok(None);
        }
        Ok(Some(self.db.open_table(CONTRACTS_TABLE).execute().await?))
    }

    fn schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("supplier", DataType::Utf8, true),
            Field::new("metadata", DataType::Utf8, true),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.dim as i32,
                ),
                true,
            ),
        ]))
    }

    fn build_batch(&self, record: &IndexRecord) -> Result<RecordBatch, StoreError> {
        let id_arr = StringArray::from(vec![record.id.clone()]);
        let supplier_arr = StringArray::from(vec![record.supplier.clone()]);
        let metadata_arr = StringArray::from(vec![serde_json::to_string(&record.metadata)?]);

        let mut emb_builder = FixedSizeListBuilder::new(Float32Builder::new(), self.dim as i32);
        for &v in &record.embedding {
            emb_builder.values().append_value(v);
        }
        emb_builder.append(true);

        let batch = RecordBatch::try_new(
            self.schema(),
            vec![
                Arc::new(id_arr),
                Arc::new(supplier_arr),
                Arc::new(metadata_arr),
                Arc::new(emb_builder.finish()),
            ],
        )?;
        Ok(batch)
    }
}

fn contracts_from_batches(batches: &[RecordBatch]) -> Result<Vec<StoredContract>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        let id_col = batch
            .column_by_name("id")
            .ok_or_else(|| StoreError::Other("missing 'id' column".into()))?;
        let supplier_col = batch.column_by_name("supplier");
        let metadata_col = batch.column_by_name("metadata");
        let distance_col = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .cloned();

        for row in 0..batch.num_rows() {
            let id = get_string(id_col.as_ref(), row)
                .ok_or_else(|| StoreError::Other(format!("null id at row {row}")))?;
            let supplier = supplier_col.and_then(|c| get_string(c.as_ref(), row));
            let metadata = match metadata_col.and_then(|c| get_string(c.as_ref(), row)) {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Null,
            };
            let distance = distance_col.as_ref().map(|a| a.value(row));
            out.push(StoredContract {
                id,
                supplier,
                metadata,
                distance,
            });
        }
    }
    Ok(out)
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

/// Escape a value for a LanceDB SQL filter literal.
fn sql_quote(s: &str) -> String {
    s.replace('\'', "''")
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const DIM: usize = 4;

    fn record(id: &str, supplier: Option<&str>, axis: usize) -> IndexRecord {
        let mut embedding = vec![0.0f32; DIM];
        embedding[axis] = 1.0;
        IndexRecord {
            id: id.to_string(),
            supplier: supplier.map(str::to_string),
            embedding,
            metadata: json!({ "contract_number": id.to_uppercase() }),
        }
    }

    async fn open_index(tmp: &TempDir) -> ContractIndex {
        ContractIndex::open(&tmp.path().join("index_db"), DIM)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_index_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let index = open_index(&tmp).await;

        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.get("missing").await.unwrap().is_none());
        assert!(index.query(&[1.0, 0.0, 0.0, 0.0], 5).await.unwrap().is_empty());
        assert!(index.supplier("nobody").await.unwrap().is_empty());
        index.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn add_get_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let index = open_index(&tmp).await;

        index.add(record("msa-1", Some("techcorp"), 0)).await.unwrap();
        index.add(record("sow-2", Some("acme"), 1)).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 2);

        let stored = index.get("msa-1").await.unwrap().unwrap();
        assert_eq!(stored.id, "msa-1");
        assert_eq!(stored.supplier.as_deref(), Some("techcorp"));
        assert_eq!(stored.metadata["contract_number"], "MSA-1");
        assert!(stored.distance.is_none());
    }

    #[tokio::test]
    async fn add_same_id_upserts() {
        let tmp = TempDir::new().unwrap();
        let index = open_index(&tmp).await;

        index.add(record("msa-1", Some("techcorp"), 0)).await.unwrap();
        let mut updated = record("msa-1", Some("techcorp"), 0);
        updated.metadata = json!({ "contract_number": "MSA-1-AMENDED" });
        index.add(updated).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let stored = index.get("msa-1").await.unwrap().unwrap();
        assert_eq!(stored.metadata["contract_number"], "MSA-1-AMENDED");
    }

    #[tokio::test]
    async fn query_ranks_by_distance() {
        let tmp = TempDir::new().unwrap();
        let index = open_index(&tmp).await;

        index.add(record("near", None, 0)).await.unwrap();
        index.add(record("far", None, 1)).await.unwrap();

        let hits = index.query(&[0.9, 0.1, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert!(hits[0].distance.unwrap() < hits[1].distance.unwrap());
    }

    #[tokio::test]
    async fn supplier_filter_returns_all_rows() {
        let tmp = TempDir::new().unwrap();
        let index = open_index(&tmp).await;

        index.add(record("a", Some("techcorp"), 0)).await.unwrap();
        index.add(record("b", Some("techcorp"), 1)).await.unwrap();
        index.add(record("c", Some("acme"), 2)).await.unwrap();

        let mut ids: Vec<String> = index
            .supplier("techcorp")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        ids.sort();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let tmp = TempDir::new().unwrap();
        let index = open_index(&tmp).await;

        index.add(record("gone", None, 0)).await.unwrap();
        index.delete("gone").await.unwrap();

        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.get("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let index = open_index(&tmp).await;

        let mut bad = record("bad", None, 0);
        bad.embedding.push(0.0);
        let err = index.add(bad).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch { got: 5, want: 4 }
        ));
    }
}
