pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod models;
pub mod parser;

pub use client::{PageQuery, PageSource, TronGridClient};
pub use config::{Mode, RunConfig, TimeWindow};
pub use error::{ConfigError, FetchError, ParseError};
pub use extract::{run, run_from_config, RunSummary};
pub use fetcher::{fetch_address, AddressHistory, FetchOptions};
pub use models::{NormalizedRecord, RawPage};
