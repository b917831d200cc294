// Specialty Reconciliation Engine - Core Library
// Exposes all modules for use in the CLI and tests

pub mod normalize;    // Name normalization
pub mod config;       // Engine configuration & similarity thresholds
pub mod error;        // Engine errors & validation results
pub mod entities;     // Canonical specialties, source rows, mapping groups
pub mod history;      // Bounded synonym history & operation log
pub mod taxonomy;     // Seed taxonomy
pub mod synonyms;     // Synonym registry & conflict detection
pub mod similarity;   // Tiered similarity scoring
pub mod matcher;      // Ranked cross-vendor candidates
pub mod ledger;       // Approve/reject/finalize state machine
pub mod aggregation;  // Canonical market data & percentile lookup
pub mod store;        // Persistence port + memory/SQLite adapters
pub mod ingest;       // Survey CSV adapter
pub mod service;      // Service object over an injected store

// Re-export commonly used types
pub use normalize::{normalize, normalize_vendor, tokens};
pub use config::{EngineConfig, SimilarityThresholds};
pub use error::{EngineError, EngineResult, SynonymValidation};
pub use entities::{
    CanonicalSpecialty, GroupOrigin, MappingGroup, Metric, Percentile, PercentileValues,
    SourceSpecialty, SpecialtyKey, SpecialtyMetadata, SpecialtySource, SurveyMetrics, SynonymSets,
};
pub use history::{
    BoundedLog, HistoryFilter, OperationKind, OperationRecord, SynonymAction, SynonymHistoryEntry, SynonymKind,
};
pub use synonyms::{AddSynonymOutcome, ConflictType, SuggestedAction, SynonymConflict, SynonymRegistry};
pub use similarity::{MatchTier, SimilarityScore, SimilarityScorer};
pub use matcher::{CandidateMatcher, CandidateStatus, MappingCandidate};
pub use ledger::{IngestSummary, MappingGroupLedger, MappingState, Transition};
pub use aggregation::{
    aggregate, percentile_lookup, AggregatedCell, AggregatedPercentiles, Breakpoints, CanonicalMarketData,
};
pub use store::{EngineSnapshot, MemoryStore, SnapshotStore, SqliteStore, SCHEMA_VERSION};
pub use ingest::{load_survey_csv, read_survey};
pub use service::{
    AutoArrangeReport, CancellationToken, ExportData, ExportDocument, ImportSummary, ReconciliationService,
    EXPORT_FORMAT_VERSION,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
