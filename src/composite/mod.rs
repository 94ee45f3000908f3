//! Composite operations spanning more than one upstream.
//!
//! # Data Flow
//! ```text
//! POST /api/files/upload-with-analysis (multipart)
//!     → storage upstream POST /upload   (body relayed unmodified)
//!     → parse fileId
//!     → analysis upstream POST /analyze  {"fileId": ...}
//!     → merged JSON (200) | file id + "unavailable" marker (502)
//! ```

pub mod upload_analysis;

pub use upload_analysis::{upload_with_analysis, wrong_method, UPLOAD_WITH_ANALYSIS_PATH};
