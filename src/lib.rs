//! Text intelligence for scam-promotion content: pulls platform names,
//! external links and messaging-group invites out of free text, and skips
//! near-duplicate documents within a scan session.

pub mod dedup;
pub mod error;
pub mod extract;
pub mod lexicon;
pub mod report;
pub mod session;
pub mod settings;

pub use dedup::{is_duplicate, normalize_title, SeenTitles};
pub use error::{Error, Result};
pub use extract::groups::extract_messaging_groups;
pub use extract::links::extract_links;
pub use extract::platforms::extract_platforms;
pub use extract::{process, Document, Extraction};
pub use lexicon::{Lexicon, LexiconLists};
pub use report::ScanReport;
pub use session::{ScanOutcome, ScanRecord, ScanSession};
pub use settings::{Settings, Tuning};
