pub mod config;
pub mod discovery;
pub mod engine;
pub mod ledger;
pub mod page_source;
pub mod sink;

pub use config::{ConfigError, ExclusionSet, MinerConfig};
pub use discovery::{
    AcceptedResult, Candidate, DiscoveryLoop, DiscoveryOutcome, DiscoverySettings, Rejection,
    StopReason,
};
pub use engine::{KeywordReport, MineEngine, RunSummary};
pub use ledger::{LedgerError, SeenLedger};
pub use page_source::{
    BrowserManager, ExtractError, GoogleResultSource, PageFetch, PageSource,
};
pub use sink::{ResultSink, SinkError};
