use prometheus::{Counter, CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;

/// Prometheus metrics for index building and retrieval
#[derive(Clone)]
pub struct IndexMetrics {
    // Counters
    pub documents_indexed: Counter,
    pub conjunctions_indexed: Counter,
    pub conjunctions_skipped: Counter,
    pub cache_lookups: CounterVec,
    pub retrievals_total: CounterVec,
    pub retrieval_errors: Counter,
    pub query_parse_failures: Counter,

    // Gauges
    pub index_documents: Gauge,
    pub index_entries: Gauge,

    // Histograms
    pub retrieve_latency: HistogramVec,

    registry: Arc<Registry>,
}

impl IndexMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let documents_indexed = Counter::with_opts(Opts::new(
            "be_indexer_documents_indexed_total",
            "Total number of documents added to builders",
        ))?;
        registry.register(Box::new(documents_indexed.clone()))?;

        let conjunctions_indexed = Counter::with_opts(Opts::new(
            "be_indexer_conjunctions_indexed_total",
            "Total number of conjunctions committed",
        ))?;
        registry.register(Box::new(conjunctions_indexed.clone()))?;

        let conjunctions_skipped = Counter::with_opts(Opts::new(
            "be_indexer_conjunctions_skipped_total",
            "Conjunctions dropped by the skip-bad-conjunction policy",
        ))?;
        registry.register(Box::new(conjunctions_skipped.clone()))?;

        let cache_lookups = CounterVec::new(
            Opts::new(
                "be_indexer_cache_lookups_total",
                "Preparation cache lookups by cache and result",
            ),
            &["cache", "result"],
        )?;
        registry.register(Box::new(cache_lookups.clone()))?;

        let retrievals_total = CounterVec::new(
            Opts::new("be_indexer_retrievals_total", "Total number of retrievals by layout"),
            &["layout"],
        )?;
        registry.register(Box::new(retrievals_total.clone()))?;

        let retrieval_errors = Counter::with_opts(Opts::new(
            "be_indexer_retrieval_errors_total",
            "Total number of failed retrievals",
        ))?;
        registry.register(Box::new(retrieval_errors.clone()))?;

        let query_parse_failures = Counter::with_opts(Opts::new(
            "be_indexer_query_parse_failures_total",
            "Query fields dropped because their values failed to parse",
        ))?;
        registry.register(Box::new(query_parse_failures.clone()))?;

        let index_documents = Gauge::with_opts(Opts::new(
            "be_indexer_index_documents",
            "Documents in the most recently built index",
        ))?;
        registry.register(Box::new(index_documents.clone()))?;

        let index_entries = Gauge::with_opts(Opts::new(
            "be_indexer_index_entries",
            "Posting entries in the most recently built index",
        ))?;
        registry.register(Box::new(index_entries.clone()))?;

        let retrieve_latency = HistogramVec::new(
            HistogramOpts::new("be_indexer_retrieve_latency_seconds", "Retrieval latency")
                .buckets(vec![0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["layout"],
        )?;
        registry.register(Box::new(retrieve_latency.clone()))?;

        Ok(Self {
            documents_indexed,
            conjunctions_indexed,
            conjunctions_skipped,
            cache_lookups,
            retrievals_total,
            retrieval_errors,
            query_parse_failures,
            index_documents,
            index_entries,
            retrieve_latency,
            registry: Arc::new(registry),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a cache lookup; `cache` is "document" or "conjunction"
    pub fn record_cache_lookup(&self, cache: &str, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[cache, result]).inc();
    }

    pub fn record_retrieve(&self, layout: &str, duration_secs: f64) {
        self.retrievals_total.with_label_values(&[layout]).inc();
        self.retrieve_latency
            .with_label_values(&[layout])
            .observe(duration_secs);
    }

    pub fn record_retrieve_error(&self) {
        self.retrieval_errors.inc();
    }

    pub fn set_index_size(&self, documents: usize, entries: usize) {
        self.index_documents.set(documents as f64);
        self.index_entries.set(entries as f64);
    }
}

impl Default for IndexMetrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

impl fmt::Debug for IndexMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexMetrics")
            .field("documents_indexed", &self.documents_indexed.get())
            .field("retrieval_errors", &self.retrieval_errors.get())
            .finish_non_exhaustive()
    }
}
