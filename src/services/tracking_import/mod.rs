//! Tracking-number import
//!
//! Label photos go through OCR one at a time; phone and tracking pairs are
//! pulled from the text, matched to open orders by phone, reviewed by the
//! operator, then written back with the order status advanced.

mod batch;
mod commit;
mod extractor;
mod matcher;
mod progress;
mod review;
mod types;


pub use batch::BatchOrchestrator;
pub use commit::{commit_matches, set_order_tracking, CommitFailure, CommitReport};
pub use extractor::extract_pairs;
pub use matcher::{find_match, match_pairs};
pub use progress::{BatchPhase, BatchState, CancelHandle, ImageStage};
pub use review::{EntrySearch, ReviewSession, ReviewStep};
pub use types::{
    BatchReport, BatchStatus, ExtractedPair, ImageResult, MatchCandidate, MatchSource,
    UnmatchedEntry,
};
