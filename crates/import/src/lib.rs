pub mod csv;
pub mod mapping;
pub mod normalize;
pub mod pipeline;
pub mod rules;
pub mod table;
#[cfg(feature = "xlsx")]
pub mod xlsx;

pub use self::csv::{read_csv, read_table, ReadError};
pub use mapping::{apply_mapping, CanonicalRow, ColumnMapping, MappingError};
pub use normalize::{DropReason, NormalizedRow, ParseOutcome, RawRecord, TransactionNormalizer};
pub use pipeline::{BuildReport, IngestionPipeline, ManualExpense};
pub use rules::{categorize, CategoryMatcher};
pub use table::{Cell, RawTable};
