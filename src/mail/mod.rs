//! Mailing-list archive parsing: boundary detection, segmentation, header
//! extraction and thread graph building.

pub mod boundary;
pub mod headers;
pub mod segment;
pub mod threading;
pub mod types;

pub use boundary::{Boundary, find_boundary};
pub use headers::{extract_headers, message_digest};
pub use segment::{Segmenter, segment};
pub use threading::{IdentityResolver, ThreadEntry, YearSummary, YearThreads, merge_summaries};
pub use types::{EmailHeaders, EmailRecord, EmailSpan, Month, ThreadKey};
