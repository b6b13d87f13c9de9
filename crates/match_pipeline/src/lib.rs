//! Match pipeline — orchestrace jednoho runu
//!
//! unparsed queue → historie hráčů po stránkách → gate → rules → ledger → Discord

pub mod pipeline;
pub mod privacy;
pub mod settings;
pub mod source;

pub use pipeline::{MatchOutcome, MatchPipeline, PipelineConfig, RunReport};
pub use privacy::check_roster_privacy;
pub use settings::{parse_date, Settings};
pub use source::{MatchSource, Notifier};
