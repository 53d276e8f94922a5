//! Logging integration for the vectorm engine.
//!
//! Provides helpers for installing a [`tracing`]-based subscriber and for
//! creating per-operation spans around storage round trips.

/// Sets up the global tracing subscriber.
///
/// `filter` is an env-filter directive string (e.g. "debug",
/// "vectorm_db=trace,info"). In debug mode a pretty, human-readable format
/// is used; otherwise a structured JSON format. Installing twice is a no-op.
pub fn setup_logging(debug: bool, filter: &str) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    if debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for a storage operation against a collection.
///
/// # Examples
///
/// ```
/// use vectorm_core::logging::operation_span;
///
/// let span = operation_span("query", "articles");
/// let _guard = span.enter();
/// tracing::debug!("issuing request");
/// ```
pub fn operation_span(operation: &str, collection: &str) -> tracing::Span {
    tracing::debug_span!("storage_op", op = operation, collection = collection)
}
