pub mod extractor;
pub mod scheduler;

pub use extractor::{ExtractorConfig, HttpExtractor};
pub use scheduler::{ExtractStats, ExtractionScheduler, SchedulerConfig};
