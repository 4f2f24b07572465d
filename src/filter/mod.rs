pub mod criteria;
pub mod engine;
pub mod presets;
pub mod table;

pub use criteria::{FilterCriteria, FilterForm};
pub use engine::{apply_filters, apply_filters_with_stats, evaluate, FilterRejection, FilterStats};
pub use presets::{builtin_presets, FilterPreset, PresetCatalog, PresetSource};
pub use table::{search_tokens, sort_tokens, SortDirection, SortKey};
