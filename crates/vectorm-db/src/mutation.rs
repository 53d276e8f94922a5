//! Mutation orchestration: save, delete, and bulk create.
//!
//! The storage layer has no native update primitive, so `save()` on an
//! already-persisted instance is implemented as delete-by-primary-key
//! followed by a full re-insert. The two steps are **not atomic**: there is
//! a window in which a concurrent reader observes neither the old nor the
//! new record, and if the insert fails after the delete succeeded the record
//! is gone from storage. That failure is surfaced explicitly as
//! [`OrmError::UpdateFailed`] carrying the pre-delete [`RecordSnapshot`];
//! [`insert_snapshot`] re-issues exactly that row so the caller can retry.
//! The engine itself never retries — blindly re-running a delete-then-insert
//! could duplicate or further corrupt state — and performs no cross-request
//! locking; callers that race writers on the same primary key must serialize
//! externally.
//!
//! Every function here validates through the field system before issuing any
//! network call.

use vectorm_core::{OrmError, OrmResult, RecordSnapshot};

use crate::client::Row;
use crate::model::Model;
use crate::query::compiler::literal;
use crate::registry;

/// Saves an instance using its schema's connection alias.
///
/// See [`save_using`] for the full contract.
pub async fn save<M: Model>(instance: &mut M) -> OrmResult<()> {
    save_using(instance, M::connection_alias()).await
}

/// Saves an instance through the connection registered under `alias`.
///
/// An instance that was never persisted is inserted once; an auto-assigned
/// primary key returned by the storage layer is adopted onto the instance.
/// A persisted instance is updated via delete-then-insert (see the module
/// documentation for the atomicity caveat).
///
/// # Errors
///
/// [`OrmError::Validation`] before any network call if a field value is
/// invalid; [`OrmError::UpdateFailed`] if the re-insert half of an update
/// fails after the delete half succeeded.
pub async fn save_using<M: Model>(instance: &mut M, alias: &str) -> OrmResult<()> {
    let row = instance.to_row()?;
    let client = registry::resolve(alias)?;
    let collection = M::collection_name();

    if instance.is_persisted() {
        let pk = instance.pk().ok_or_else(|| OrmError::NotPersisted {
            model: M::model_name().to_string(),
        })?;
        let snapshot = RecordSnapshot::new(collection, row.clone().into_pairs());
        let expr = pk_expr::<M>(&pk)?;

        tracing::debug!(collection, expr = %expr, "update: deleting old record");
        client.delete(collection, &expr).await?;

        tracing::debug!(collection, "update: inserting new record");
        match client.insert(collection, vec![row]).await {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::warn!(
                    collection,
                    error = %err,
                    "insert failed after delete; record exists only in snapshot"
                );
                Err(OrmError::UpdateFailed {
                    snapshot,
                    message: err.to_string(),
                })
            }
        }
    } else {
        tracing::debug!(collection, "inserting new record");
        let result = client.insert(collection, vec![row]).await?;
        if instance.pk().is_none() {
            if let Some(assigned) = result.primary_keys.first() {
                instance.set_pk(assigned.clone());
            }
        }
        instance.set_persisted(true);
        Ok(())
    }
}

/// Deletes an instance by primary key using its schema's connection alias.
pub async fn delete<M: Model>(instance: &mut M) -> OrmResult<u64> {
    delete_using(instance, M::connection_alias()).await
}

/// Deletes an instance by primary key through the connection registered
/// under `alias`. Returns the storage layer's delete count and marks the
/// instance unpersisted.
///
/// # Errors
///
/// [`OrmError::NotPersisted`] if the instance has no persisted primary key.
pub async fn delete_using<M: Model>(instance: &mut M, alias: &str) -> OrmResult<u64> {
    if !instance.is_persisted() {
        return Err(OrmError::NotPersisted {
            model: M::model_name().to_string(),
        });
    }
    let pk = instance.pk().ok_or_else(|| OrmError::NotPersisted {
        model: M::model_name().to_string(),
    })?;

    let client = registry::resolve(alias)?;
    let expr = pk_expr::<M>(&pk)?;
    tracing::debug!(collection = M::collection_name(), expr = %expr, "deleting record");
    let count = client.delete(M::collection_name(), &expr).await?;
    instance.set_persisted(false);
    Ok(count)
}

/// Inserts many instances in a single batched request, using the schema's
/// connection alias. See [`bulk_create_using`].
pub async fn bulk_create<M: Model>(instances: &mut [M]) -> OrmResult<usize> {
    bulk_create_using(instances, M::connection_alias()).await
}

/// Inserts many instances in a single batched request.
///
/// Every instance is validated before any network call: the first invalid
/// field aborts the whole batch with zero rows sent — there is no partial
/// validate-then-insert. Returns the count the storage layer reports;
/// auto-assigned primary keys are adopted in insert order.
pub async fn bulk_create_using<M: Model>(instances: &mut [M], alias: &str) -> OrmResult<usize> {
    if instances.is_empty() {
        return Ok(0);
    }

    let mut rows = Vec::with_capacity(instances.len());
    for instance in instances.iter() {
        rows.push(instance.to_row()?);
    }

    let client = registry::resolve(alias)?;
    tracing::debug!(
        collection = M::collection_name(),
        count = rows.len(),
        "bulk inserting records"
    );
    let result = client.insert(M::collection_name(), rows).await?;

    for (i, instance) in instances.iter_mut().enumerate() {
        if instance.pk().is_none() {
            if let Some(assigned) = result.primary_keys.get(i) {
                instance.set_pk(assigned.clone());
            }
        }
        instance.set_persisted(true);
    }
    Ok(result.insert_count)
}

/// Re-inserts the row preserved by an [`OrmError::UpdateFailed`].
///
/// This is the caller-driven retry path for the non-atomic update window:
/// the snapshot holds the record exactly as it was before the delete, so a
/// successful re-insert restores the pre-update state.
pub async fn insert_snapshot(alias: &str, snapshot: &RecordSnapshot) -> OrmResult<usize> {
    let client = registry::resolve(alias)?;
    let (columns, values): (Vec<String>, Vec<_>) = snapshot.values.iter().cloned().unzip();
    let row = Row::new(columns, values);
    tracing::debug!(collection = %snapshot.collection, "re-inserting snapshot");
    let result = client.insert(&snapshot.collection, vec![row]).await?;
    Ok(result.insert_count)
}

/// Renders the `pk == literal` expression selecting one record.
fn pk_expr<M: Model>(pk: &vectorm_core::Value) -> OrmResult<String> {
    let field = M::schema().primary_key();
    Ok(format!("{} == {}", field.name, literal(pk)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{InsertResult, ScalarQuery, VectorClient, VectorSearch};
    use crate::fields::{FieldDef, FieldType};
    use crate::model::ModelSchema;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, LazyLock, Mutex};
    use vectorm_core::Value;

    struct Note {
        id: Option<i64>,
        body: String,
        persisted: bool,
    }

    impl Note {
        fn new(body: &str) -> Self {
            Self {
                id: None,
                body: body.to_string(),
                persisted: false,
            }
        }
    }

    impl Model for Note {
        fn schema() -> &'static ModelSchema {
            static SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
                ModelSchema::builder("Note", "notes")
                    .field(FieldDef::new("id", FieldType::Int64).primary_key().auto_id())
                    .field(FieldDef::new("body", FieldType::VarChar).max_length(100))
                    .build()
                    .expect("valid Note schema")
            });
            &SCHEMA
        }

        fn field_values(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", Value::from(self.id)),
                ("body", Value::from(self.body.clone())),
            ]
        }

        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.get("id")?,
                body: row.get("body")?,
                persisted: true,
            })
        }

        fn pk(&self) -> Option<Value> {
            self.id.map(Value::Int)
        }
        fn set_pk(&mut self, value: Value) {
            self.id = value.as_int();
        }
        fn is_persisted(&self) -> bool {
            self.persisted
        }
        fn set_persisted(&mut self, persisted: bool) {
            self.persisted = persisted;
        }
    }

    #[derive(Default)]
    struct MockClient {
        fail_inserts: AtomicBool,
        deletes: Mutex<Vec<String>>,
        inserted: Mutex<Vec<Row>>,
    }

    #[async_trait::async_trait]
    impl VectorClient for MockClient {
        async fn query(&self, _request: ScalarQuery) -> OrmResult<Vec<Row>> {
            Ok(Vec::new())
        }
        async fn search(&self, _request: VectorSearch) -> OrmResult<Vec<Row>> {
            Ok(Vec::new())
        }
        async fn insert(&self, _collection: &str, rows: Vec<Row>) -> OrmResult<InsertResult> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(OrmError::Storage("insert rejected".to_string()));
            }
            let count = rows.len();
            let start = self.inserted.lock().unwrap().len() as i64;
            self.inserted.lock().unwrap().extend(rows);
            Ok(InsertResult {
                insert_count: count,
                primary_keys: (0..count).map(|i| Value::Int(start + 1 + i as i64)).collect(),
            })
        }
        async fn delete(&self, _collection: &str, expr: &str) -> OrmResult<u64> {
            self.deletes.lock().unwrap().push(expr.to_string());
            Ok(1)
        }
    }

    fn install(alias: &str) -> Arc<MockClient> {
        let client = Arc::new(MockClient::default());
        registry::register(alias, client.clone());
        client
    }

    #[tokio::test]
    async fn test_save_new_inserts_and_adopts_pk() {
        let client = install("mutation_save_new");
        let mut note = Note::new("hello");
        save_using(&mut note, "mutation_save_new").await.unwrap();
        assert!(note.persisted);
        assert_eq!(note.id, Some(1));
        assert_eq!(client.inserted.lock().unwrap().len(), 1);
        assert!(client.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_persisted_deletes_then_inserts() {
        let client = install("mutation_save_update");
        let mut note = Note::new("hello");
        save_using(&mut note, "mutation_save_update").await.unwrap();
        note.body = "edited".to_string();
        save_using(&mut note, "mutation_save_update").await.unwrap();

        let deletes = client.deletes.lock().unwrap();
        assert_eq!(deletes.as_slice(), ["id == 1"]);
        assert_eq!(client.inserted.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_failure_surfaces_snapshot() {
        let client = install("mutation_update_fail");
        let mut note = Note::new("precious");
        save_using(&mut note, "mutation_update_fail").await.unwrap();

        client.fail_inserts.store(true, Ordering::SeqCst);
        note.body = "changed".to_string();
        let err = save_using(&mut note, "mutation_update_fail")
            .await
            .unwrap_err();
        match err {
            OrmError::UpdateFailed { snapshot, .. } => {
                assert_eq!(snapshot.collection, "notes");
                // The snapshot holds the values sent with the failed insert,
                // i.e. the full current field set.
                assert_eq!(
                    snapshot.get("body"),
                    Some(&Value::String("changed".to_string()))
                );
                assert_eq!(snapshot.get("id"), Some(&Value::Int(1)));

                // Caller-driven retry restores the record.
                client.fail_inserts.store(false, Ordering::SeqCst);
                let restored = insert_snapshot("mutation_update_fail", &snapshot)
                    .await
                    .unwrap();
                assert_eq!(restored, 1);
            }
            other => panic!("expected UpdateFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validation_fails_before_any_network() {
        let client = install("mutation_validation");
        let mut note = Note::new(&"x".repeat(500));
        let err = save_using(&mut note, "mutation_validation").await.unwrap_err();
        assert!(matches!(err, OrmError::Validation { .. }));
        assert!(client.inserted.lock().unwrap().is_empty());
        assert!(client.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_persistence() {
        install("mutation_delete_unsaved");
        let mut note = Note::new("never saved");
        let err = delete_using(&mut note, "mutation_delete_unsaved")
            .await
            .unwrap_err();
        match err {
            OrmError::NotPersisted { model } => assert_eq!(model, "Note"),
            other => panic!("expected NotPersisted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_by_primary_key() {
        let client = install("mutation_delete");
        let mut note = Note::new("bye");
        save_using(&mut note, "mutation_delete").await.unwrap();
        let count = delete_using(&mut note, "mutation_delete").await.unwrap();
        assert_eq!(count, 1);
        assert!(!note.persisted);
        assert_eq!(client.deletes.lock().unwrap().as_slice(), ["id == 1"]);
    }

    #[tokio::test]
    async fn test_bulk_create_all_or_nothing_validation() {
        let client = install("mutation_bulk_invalid");
        let mut notes = vec![
            Note::new("fine"),
            Note::new(&"x".repeat(500)),
            Note::new("also fine"),
        ];
        let err = bulk_create_using(&mut notes, "mutation_bulk_invalid")
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Validation { .. }));
        // Nothing reached the network.
        assert!(client.inserted.lock().unwrap().is_empty());
        assert!(!notes[0].persisted);
    }

    #[tokio::test]
    async fn test_bulk_create_inserts_and_adopts_pks() {
        let client = install("mutation_bulk");
        let mut notes = vec![Note::new("a"), Note::new("b"), Note::new("c")];
        let count = bulk_create_using(&mut notes, "mutation_bulk").await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(client.inserted.lock().unwrap().len(), 3);
        assert_eq!(notes[0].id, Some(1));
        assert_eq!(notes[2].id, Some(3));
        assert!(notes.iter().all(|n| n.persisted));
    }

    #[tokio::test]
    async fn test_bulk_create_empty_is_noop() {
        let mut notes: Vec<Note> = Vec::new();
        // No registered alias needed: the empty batch never resolves one.
        let count = bulk_create_using(&mut notes, "mutation_bulk_never_registered")
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
