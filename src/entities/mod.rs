// Entity Models
//
// - CanonicalSpecialty: the taxonomy entry (identity = UUID)
// - SourceSpecialty: one vendor's row (identity = normalized name + vendor)
// - MappingGroup: committed equivalence between source specialties

pub mod group;
pub mod source;
pub mod specialty;

pub use group::{GroupOrigin, MappingGroup};
pub use source::{Metric, Percentile, PercentileValues, SourceSpecialty, SpecialtyKey, SurveyMetrics};
pub use specialty::{CanonicalSpecialty, SpecialtyMetadata, SpecialtySource, SynonymSets};
