//! The lazy, immutable QuerySet.
//!
//! A [`QuerySet`] is a chainable cursor over a model's collection. Chain
//! methods record intended operations in an immutable [`QuerySpec`] without
//! touching the network; a terminal call compiles the filter tree, resolves
//! the connection alias, issues a single request, and materializes typed
//! model instances. Results are cached on the set: evaluating the same
//! `QuerySet` twice issues at most one request.
//!
//! Every chain method consumes `self` and returns a new, unevaluated set;
//! cloning a set forks an unevaluated copy of its specification. Because the
//! specification is a value, a `QuerySet` is safe to branch into independent
//! chains and to share across concurrent tasks, and cancelling an in-flight
//! terminal call leaves nothing in a half-mutated state.
//!
//! Configuration errors (zero limit, sort + search conflict, unknown
//! projection field, type-mismatched lookups) surface at chain-build time —
//! never after a network call.

use std::cmp::Ordering;
use std::marker::PhantomData;

use tokio::sync::OnceCell;

use vectorm_core::{OrmError, OrmResult, Value};

use crate::client::{Row, ScalarQuery, VectorSearch};
use crate::model::Model;
use crate::query::compiler::{check_filter, compile_filter};
use crate::query::lookups::Q;
use crate::registry;

/// The implicit pseudo-field under which the search path exposes each hit's
/// neighbor distance. It is also the only key `order_by` accepts while a
/// search directive is active: the storage layer returns neighbors already
/// ranked by distance and supports no secondary scalar sort over that set.
pub const DISTANCE_FIELD: &str = "distance";

/// An ordering key with direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The field (or distance pseudo-field) to order by.
    pub field: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Parses an ordering key; a leading `-` denotes descending order.
    pub fn parse(key: &str) -> Self {
        key.strip_prefix('-').map_or_else(
            || Self {
                field: key.to_string(),
                descending: false,
            },
            |stripped| Self {
                field: stripped.to_string(),
                descending: true,
            },
        )
    }
}

/// A nearest-neighbor search directive attached to a query specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDirective {
    /// The vector field to search against.
    pub field: String,
    /// The query vector (already checked against the field's dimensionality).
    pub vector: Vec<f32>,
    /// The distance metric, passed through opaquely.
    pub metric: String,
    /// Maximum number of neighbors to retrieve.
    pub top_k: usize,
}

/// The immutable payload a [`QuerySet`] carries.
///
/// Every chain call builds a new specification by copying and extending the
/// previous one; nothing is ever mutated in place after a set is returned to
/// the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// The predicate tree; `None` means match-all.
    pub filter: Option<Q>,
    /// Optional ordering key with direction.
    pub order_by: Option<OrderBy>,
    /// Maximum number of rows to materialize.
    pub limit: Option<usize>,
    /// Number of leading rows to skip.
    pub offset: Option<usize>,
    /// Optional nearest-neighbor search directive.
    pub search: Option<SearchDirective>,
    /// Optional projection; `None` means all declared fields.
    pub output_fields: Option<Vec<String>>,
    /// Column name under which to additionally expose the neighbor distance.
    pub distance_alias: Option<String>,
    /// Connection alias override; `None` means the schema's alias.
    pub using: Option<String>,
}

/// A lazy, composable query over a model's collection.
///
/// See the [module documentation](self) for the evaluation model.
pub struct QuerySet<M: Model> {
    spec: QuerySpec,
    cache: OnceCell<Vec<M>>,
    _model: PhantomData<M>,
}

impl<M: Model> Clone for QuerySet<M> {
    /// Forks an unevaluated set with the same specification. The receiver's
    /// result cache is not carried over.
    fn clone(&self) -> Self {
        Self::from_spec(self.spec.clone())
    }
}

impl<M: Model> std::fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("spec", &self.spec)
            .field("evaluated", &self.is_evaluated())
            .finish()
    }
}

impl<M: Model> Default for QuerySet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> QuerySet<M> {
    /// Creates a fresh, unevaluated set matching the whole collection.
    pub fn new() -> Self {
        Self::from_spec(QuerySpec::default())
    }

    fn from_spec(spec: QuerySpec) -> Self {
        Self {
            spec,
            cache: OnceCell::new(),
            _model: PhantomData,
        }
    }

    /// Returns the underlying specification.
    pub const fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Returns `true` once a terminal call has populated the result cache.
    pub fn is_evaluated(&self) -> bool {
        self.cache.initialized()
    }

    // ── Chain methods (lazy) ─────────────────────────────────────────

    /// AND-combines a predicate with the existing filter tree.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Compile`] if the predicate names an unknown field
    /// or uses a lookup invalid for the field's type.
    pub fn filter(mut self, q: Q) -> OrmResult<Self> {
        check_filter(M::schema(), &q)?;
        if q.is_empty() {
            return Ok(self);
        }
        self.spec.filter = Some(match self.spec.filter.take() {
            Some(existing) => existing & q,
            None => q,
        });
        Ok(Self::from_spec(self.spec))
    }

    /// AND-combines the logical negation of a predicate.
    ///
    /// # Errors
    ///
    /// Same as [`filter`](Self::filter).
    pub fn exclude(self, q: Q) -> OrmResult<Self> {
        if q.is_empty() {
            return Ok(self);
        }
        self.filter(!q)
    }

    /// Replaces the ordering directive. A leading `-` on the key denotes
    /// descending order.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::QueryConfig`] when a search directive is active
    /// and the key is anything other than the distance pseudo-field, or when
    /// the key names no declared field.
    pub fn order_by(mut self, key: &str) -> OrmResult<Self> {
        let order = OrderBy::parse(key);
        if self.spec.search.is_some() && order.field != DISTANCE_FIELD {
            return Err(OrmError::QueryConfig(format!(
                "cannot order by '{}' while a vector search is active; \
                 results are ranked by distance",
                order.field
            )));
        }
        if order.field != DISTANCE_FIELD {
            let field = M::schema().field(&order.field).ok_or_else(|| {
                OrmError::QueryConfig(format!(
                    "cannot order by unknown field '{}'",
                    order.field
                ))
            })?;
            if field.field_type.is_vector() || field.field_type == crate::fields::FieldType::Json {
                return Err(OrmError::QueryConfig(format!(
                    "field '{}' has no ordering",
                    order.field
                )));
            }
        }
        self.spec.order_by = Some(order);
        Ok(Self::from_spec(self.spec))
    }

    /// Sets the maximum number of rows to materialize.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::QueryConfig`] for a zero limit.
    pub fn limit(mut self, n: usize) -> OrmResult<Self> {
        if n == 0 {
            return Err(OrmError::QueryConfig(
                "limit must be positive".to_string(),
            ));
        }
        self.spec.limit = Some(n);
        Ok(Self::from_spec(self.spec))
    }

    /// Sets the number of leading rows to skip.
    #[must_use]
    pub fn offset(mut self, n: usize) -> Self {
        self.spec.offset = Some(n);
        Self::from_spec(self.spec)
    }

    /// Restricts the returned fields to the given projection.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::QueryConfig`] if a name matches no declared field.
    pub fn only(mut self, fields: &[&str]) -> OrmResult<Self> {
        for name in fields {
            if M::schema().field(name).is_none() {
                return Err(OrmError::QueryConfig(format!(
                    "cannot project unknown field '{name}'"
                )));
            }
        }
        self.spec.output_fields = Some(fields.iter().map(|name| (*name).to_string()).collect());
        Ok(Self::from_spec(self.spec))
    }

    /// Additionally exposes each hit's neighbor distance under `alias` in the
    /// materialized rows.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::QueryConfig`] when no search directive is active.
    pub fn annotate_distance(mut self, alias: &str) -> OrmResult<Self> {
        if self.spec.search.is_none() {
            return Err(OrmError::QueryConfig(
                "distance annotation requires an active search directive".to_string(),
            ));
        }
        self.spec.distance_alias = Some(alias.to_string());
        Ok(Self::from_spec(self.spec))
    }

    /// Attaches a nearest-neighbor search directive.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] if `field` is not a declared vector field
    /// or the query vector's length differs from its dimensionality;
    /// [`OrmError::QueryConfig`] for a zero `top_k` or when an ordering other
    /// than the distance pseudo-field is already set.
    pub fn search(
        mut self,
        vector: Vec<f32>,
        field: &str,
        metric: &str,
        top_k: usize,
    ) -> OrmResult<Self> {
        let def = M::schema().field(field).ok_or_else(|| {
            OrmError::Schema(format!(
                "search field '{field}' is not declared on model '{}'",
                M::model_name()
            ))
        })?;
        let dim = def.dim().ok_or_else(|| {
            OrmError::Schema(format!("search field '{field}' is not a vector field"))
        })?;
        if vector.len() != dim {
            return Err(OrmError::Schema(format!(
                "query vector dimension mismatch on '{field}': expected {dim}, got {}",
                vector.len()
            )));
        }
        if top_k == 0 {
            return Err(OrmError::QueryConfig("top_k must be positive".to_string()));
        }
        if let Some(order) = &self.spec.order_by {
            if order.field != DISTANCE_FIELD {
                return Err(OrmError::QueryConfig(format!(
                    "cannot attach a vector search while ordering by '{}'",
                    order.field
                )));
            }
        }
        self.spec.search = Some(SearchDirective {
            field: field.to_string(),
            vector,
            metric: metric.to_string(),
            top_k,
        });
        Ok(Self::from_spec(self.spec))
    }

    /// Overrides the connection alias for this chain.
    #[must_use]
    pub fn using(mut self, alias: &str) -> Self {
        self.spec.using = Some(alias.to_string());
        Self::from_spec(self.spec)
    }

    // ── Terminal methods (evaluate) ──────────────────────────────────

    /// Evaluates the set and returns the materialized instances.
    ///
    /// The first call issues exactly one request and caches the result;
    /// subsequent calls on the same object return the cached slice without
    /// touching the network.
    pub async fn all(&self) -> OrmResult<&[M]> {
        let cached = self.cache.get_or_try_init(|| self.run()).await?;
        Ok(cached.as_slice())
    }

    /// Evaluates with the given extra predicate and an implicit limit of 2,
    /// expecting exactly one match.
    ///
    /// # Errors
    ///
    /// [`OrmError::DoesNotExist`] for zero matches,
    /// [`OrmError::MultipleObjectsReturned`] for more than one — both
    /// carrying this model's name.
    pub async fn get(&self, q: Q) -> OrmResult<M> {
        let probe = self.clone().filter(q)?.limit(2)?;
        let mut results = probe.run().await?;
        match results.len() {
            0 => Err(OrmError::DoesNotExist {
                model: M::model_name().to_string(),
            }),
            1 => Ok(results.remove(0)),
            count => Err(OrmError::MultipleObjectsReturned {
                model: M::model_name().to_string(),
                count,
            }),
        }
    }

    /// Returns the first matching instance, or `None`.
    pub async fn first(&self) -> OrmResult<Option<M>> {
        let mut results = self.clone().limit(1)?.run().await?;
        Ok(if results.is_empty() {
            None
        } else {
            Some(results.remove(0))
        })
    }

    /// Returns whether any rows match.
    pub async fn exists(&self) -> OrmResult<bool> {
        Ok(self.count().await? > 0)
    }

    /// Returns the number of matching rows.
    ///
    /// Served by the storage layer's dedicated count request when available
    /// and when no limit/offset/search is configured (those change what
    /// evaluation would return); otherwise evaluates and measures. Both paths
    /// agree with `all().len()` for the same specification.
    pub async fn count(&self) -> OrmResult<usize> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached.len());
        }

        let plain = self.spec.search.is_none()
            && self.spec.limit.is_none()
            && self.spec.offset.is_none();
        if plain {
            let expr = self.compile_expr()?;
            let client = registry::resolve(self.alias())?;
            if let Some(n) = client.count(M::collection_name(), &expr).await? {
                return Ok(usize::try_from(n).unwrap_or(usize::MAX));
            }
        }

        Ok(self.run().await?.len())
    }

    /// Returns the single instance matching `q`, creating and saving one from
    /// `build` when none exists. The boolean reports whether a new instance
    /// was created.
    pub async fn get_or_create<F>(&self, q: Q, build: F) -> OrmResult<(M, bool)>
    where
        F: FnOnce() -> M,
    {
        match self.get(q).await {
            Ok(found) => Ok((found, false)),
            Err(OrmError::DoesNotExist { .. }) => {
                let mut instance = build();
                crate::mutation::save_using(&mut instance, self.alias()).await?;
                Ok((instance, true))
            }
            Err(err) => Err(err),
        }
    }

    // ── Evaluation internals ─────────────────────────────────────────

    fn alias(&self) -> &str {
        match self.spec.using.as_deref() {
            Some(alias) => alias,
            None => M::connection_alias(),
        }
    }

    fn compile_expr(&self) -> OrmResult<String> {
        match &self.spec.filter {
            Some(q) => compile_filter(M::schema(), q),
            None => Ok(String::new()),
        }
    }

    /// Performs one full evaluation: compile, resolve, request, validate,
    /// materialize. Does not consult or populate the cache.
    async fn run(&self) -> OrmResult<Vec<M>> {
        let schema = M::schema();
        let expr = self.compile_expr()?;

        // A distance ordering without a search directive has nothing to sort
        // by unless the model happens to declare such a field itself.
        if let Some(order) = &self.spec.order_by {
            if self.spec.search.is_none()
                && order.field == DISTANCE_FIELD
                && schema.field(DISTANCE_FIELD).is_none()
            {
                return Err(OrmError::QueryConfig(
                    "ordering by distance requires an active search directive".to_string(),
                ));
            }
        }

        let client = registry::resolve(self.alias())?;

        let rows = if let Some(search) = &self.spec.search {
            let request = VectorSearch {
                collection: M::collection_name().to_string(),
                expr,
                field: search.field.clone(),
                vector: search.vector.clone(),
                metric: search.metric.clone(),
                top_k: search.top_k,
                output_fields: self.spec.output_fields.clone(),
            };
            tracing::debug!(
                collection = M::collection_name(),
                field = %search.field,
                top_k = search.top_k,
                "issuing vector search"
            );
            let hits = client.search(request).await?;
            // Hits arrive ranked by distance; pagination slices the ranking.
            let mut rows: Vec<Row> = hits
                .into_iter()
                .skip(self.spec.offset.unwrap_or(0))
                .take(self.spec.limit.unwrap_or(usize::MAX))
                .collect();
            if let Some(alias) = &self.spec.distance_alias {
                if alias != DISTANCE_FIELD {
                    for row in &mut rows {
                        if let Some(d) = row.get_value(DISTANCE_FIELD).cloned() {
                            row.push(alias.clone(), d);
                        }
                    }
                }
            }
            rows
        } else if let Some(order) = self.spec.order_by.clone() {
            // The storage layer's scalar query has no order parameter, so the
            // engine sorts; pagination must then slice the sorted rows, not
            // the retrieval.
            let request = ScalarQuery {
                collection: M::collection_name().to_string(),
                expr,
                output_fields: self.spec.output_fields.clone(),
                limit: None,
                offset: None,
            };
            tracing::debug!(
                collection = M::collection_name(),
                ordered_by = %order.field,
                "issuing scalar query"
            );
            let mut rows = client.query(request).await?;
            sort_rows(&mut rows, &order);
            rows.into_iter()
                .skip(self.spec.offset.unwrap_or(0))
                .take(self.spec.limit.unwrap_or(usize::MAX))
                .collect()
        } else {
            let request = ScalarQuery {
                collection: M::collection_name().to_string(),
                expr,
                output_fields: self.spec.output_fields.clone(),
                limit: self.spec.limit,
                offset: self.spec.offset,
            };
            tracing::debug!(collection = M::collection_name(), "issuing scalar query");
            client.query(request).await?
        };

        // A partially-typed result set is worse than none: the first row
        // failing field validation aborts the whole evaluation.
        for row in &rows {
            schema.validate_row(row).map_err(|err| match err {
                OrmError::Validation { field, message } => OrmError::DataIntegrity {
                    collection: M::collection_name().to_string(),
                    field,
                    message,
                },
                other => other,
            })?;
        }

        rows.iter().map(M::from_row).collect()
    }
}

fn sort_rows(rows: &mut [Row], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ordering = compare_cells(a.get_value(&order.field), b.get_value(&order.field));
        if order.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Total order over optional cells: absent/null sorts first, then by value.
/// Cross-type comparisons never occur on validated rows.
fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None | Some(Value::Null)) => Ordering::Greater,
        (Some(left), Some(right)) => compare_values(left, right),
    }
}

#[allow(clippy::cast_precision_loss)]
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Int(x), Value::Float(y)) => {
            (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Value::Float(x), Value::Int(y)) => {
            x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDef, FieldType};
    use crate::model::ModelSchema;
    use crate::query::lookups::Lookup;
    use std::sync::LazyLock;

    #[derive(Debug)]
    struct Article {
        id: Option<i64>,
        title: String,
        rating: f64,
        persisted: bool,
    }

    impl Model for Article {
        fn schema() -> &'static ModelSchema {
            static SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
                ModelSchema::builder("Article", "articles")
                    .field(FieldDef::new("id", FieldType::Int64).primary_key().auto_id())
                    .field(FieldDef::new("title", FieldType::VarChar).max_length(200))
                    .field(FieldDef::new("rating", FieldType::Double).default(0.0))
                    .field(FieldDef::new("embedding", FieldType::FloatVector { dim: 4 }).nullable())
                    .build()
                    .expect("valid Article schema")
            });
            &SCHEMA
        }

        fn field_values(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", Value::from(self.id)),
                ("title", Value::from(self.title.clone())),
                ("rating", Value::from(self.rating)),
            ]
        }

        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.get("id")?,
                title: row.get("title")?,
                rating: row.get::<Option<f64>>("rating")?.unwrap_or_default(),
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

    fn title_eq(v: &str) -> Q {
        Q::filter("title", Lookup::Eq(Value::from(v)))
    }

    #[test]
    fn test_chain_returns_new_unevaluated_set() {
        let base = Article::objects();
        let chained = base.clone().filter(title_eq("x")).unwrap();
        assert!(base.spec().filter.is_none());
        assert!(chained.spec().filter.is_some());
        assert!(!chained.is_evaluated());
    }

    #[test]
    fn test_branching_does_not_interfere() {
        let base = Article::objects().filter(title_eq("x")).unwrap();
        let left = base.clone().limit(5).unwrap();
        let right = base.clone().offset(10);
        assert_eq!(left.spec().limit, Some(5));
        assert_eq!(left.spec().offset, None);
        assert_eq!(right.spec().limit, None);
        assert_eq!(right.spec().offset, Some(10));
        assert_eq!(base.spec().limit, None);
    }

    #[test]
    fn test_filter_and_combines() {
        let qs = Article::objects()
            .filter(title_eq("a"))
            .unwrap()
            .filter(Q::filter("rating", Lookup::Gt(Value::from(3.0))))
            .unwrap();
        match qs.spec().filter.as_ref().unwrap() {
            Q::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_exclude_negates() {
        let qs = Article::objects().exclude(title_eq("a")).unwrap();
        assert!(matches!(qs.spec().filter, Some(Q::Not(_))));
    }

    #[test]
    fn test_filter_rejects_bad_lookup_before_any_network() {
        let err = Article::objects()
            .filter(Q::filter("rating", Lookup::Contains("x".to_string())))
            .unwrap_err();
        assert!(matches!(err, OrmError::Compile(_)));
    }

    #[test]
    fn test_limit_zero_rejected() {
        let err = Article::objects().limit(0).unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));
    }

    #[test]
    fn test_order_by_parses_direction() {
        let asc = Article::objects().order_by("title").unwrap();
        assert_eq!(
            asc.spec().order_by,
            Some(OrderBy {
                field: "title".to_string(),
                descending: false
            })
        );
        let desc = Article::objects().order_by("-title").unwrap();
        assert!(desc.spec().order_by.as_ref().unwrap().descending);
    }

    #[test]
    fn test_order_by_unknown_field_rejected() {
        let err = Article::objects().order_by("nope").unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));
    }

    #[test]
    fn test_order_by_vector_field_rejected() {
        let err = Article::objects().order_by("embedding").unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));
    }

    #[test]
    fn test_search_then_order_by_scalar_field_rejected() {
        let qs = Article::objects()
            .search(vec![0.0; 4], "embedding", "L2", 10)
            .unwrap();
        let err = qs.order_by("title").unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));
    }

    #[test]
    fn test_order_by_then_search_rejected() {
        let qs = Article::objects().order_by("title").unwrap();
        let err = qs
            .search(vec![0.0; 4], "embedding", "L2", 10)
            .unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));
    }

    #[test]
    fn test_search_with_distance_ordering_allowed() {
        let qs = Article::objects()
            .search(vec![0.0; 4], "embedding", "L2", 10)
            .unwrap()
            .order_by(DISTANCE_FIELD)
            .unwrap();
        assert!(qs.spec().search.is_some());
    }

    #[test]
    fn test_search_dimension_mismatch_rejected() {
        let err = Article::objects()
            .search(vec![0.0; 3], "embedding", "L2", 10)
            .unwrap_err();
        assert!(matches!(err, OrmError::Schema(_)));
    }

    #[test]
    fn test_search_non_vector_field_rejected() {
        let err = Article::objects()
            .search(vec![0.0; 4], "title", "L2", 10)
            .unwrap_err();
        assert!(matches!(err, OrmError::Schema(_)));
    }

    #[test]
    fn test_search_zero_top_k_rejected() {
        let err = Article::objects()
            .search(vec![0.0; 4], "embedding", "L2", 0)
            .unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));
    }

    #[test]
    fn test_annotate_distance_requires_search() {
        let err = Article::objects().annotate_distance("score").unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));

        let qs = Article::objects()
            .search(vec![0.0; 4], "embedding", "L2", 5)
            .unwrap()
            .annotate_distance("score")
            .unwrap();
        assert_eq!(qs.spec().distance_alias.as_deref(), Some("score"));
    }

    #[test]
    fn test_only_rejects_unknown_field() {
        let err = Article::objects().only(&["nope"]).unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));
    }

    #[test]
    fn test_using_overrides_alias() {
        let qs = Article::objects().using("replica");
        assert_eq!(qs.spec().using.as_deref(), Some("replica"));
        assert_eq!(qs.alias(), "replica");
    }

    #[tokio::test]
    async fn test_evaluation_requires_registered_connection() {
        let qs = Article::objects().using("queryset_tests_unregistered");
        let err = qs.all().await.unwrap_err();
        assert!(matches!(err, OrmError::ConnectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_distance_ordering_without_search_fails_before_network() {
        // The alias is deliberately unregistered: the config error must win
        // because it is detected before the registry is consulted.
        let qs = Article::objects()
            .using("queryset_tests_unregistered")
            .order_by(DISTANCE_FIELD)
            .unwrap();
        let err = qs.all().await.unwrap_err();
        assert!(matches!(err, OrmError::QueryConfig(_)));
    }

    #[test]
    fn test_order_by_parse_helper() {
        let o = OrderBy::parse("-rating");
        assert_eq!(o.field, "rating");
        assert!(o.descending);
        let o = OrderBy::parse("rating");
        assert!(!o.descending);
    }

    #[test]
    fn test_compare_cells_null_first() {
        assert_eq!(
            compare_cells(None, Some(&Value::Int(1))),
            Ordering::Less
        );
        assert_eq!(
            compare_cells(Some(&Value::Null), Some(&Value::Int(1))),
            Ordering::Less
        );
        assert_eq!(compare_cells(None, None), Ordering::Equal);
    }

    #[test]
    fn test_compare_values_numeric_mix() {
        assert_eq!(
            compare_values(&Value::Int(2), &Value::Float(1.5)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Value::String("a".into()), &Value::String("b".into())),
            Ordering::Less
        );
    }

    #[test]
    fn test_sort_rows_descending() {
        let mut rows = vec![
            Row::new(vec!["rating".to_string()], vec![Value::Float(1.0)]),
            Row::new(vec!["rating".to_string()], vec![Value::Float(3.0)]),
            Row::new(vec!["rating".to_string()], vec![Value::Float(2.0)]),
        ];
        sort_rows(
            &mut rows,
            &OrderBy {
                field: "rating".to_string(),
                descending: true,
            },
        );
        let values: Vec<f64> = rows.iter().map(|r| r.get::<f64>("rating").unwrap()).collect();
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
    }
}
