//! Reconstruct emails and reply threads from concatenated mailing-list
//! archives (pipermail `<year>-<Month>.txt` files).

pub mod archive;
pub mod config;
pub mod mail;
pub mod output;
pub mod pipeline;

pub use archive::{ArchiveDir, ArchiveSource};
pub use config::Config;
pub use mail::{EmailHeaders, EmailRecord, Month, Segmenter, ThreadKey, YearSummary, YearThreads};
pub use output::{AggregateSink, EmlWriter, JsonAggregates, NullSink, RecordSink, StoredEmail};
pub use pipeline::{process_year, process_years, run};
