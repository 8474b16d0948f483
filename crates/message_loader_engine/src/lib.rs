//! Message loader engine: document model, fetching and the concurrent run.
mod config;
mod decode;
mod fetch;
mod loader;
mod page;
mod task;
mod types;

pub use config::{ConfigError, LoaderConfig, LoaderSettings};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use loader::{ChannelEventSink, EventSink, Loader, NullSink, RunReport};
pub use page::{document_loading, marker_selector, Document, DocumentReady, DomElement, Page};
pub use task::FetchTask;
pub use types::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, LoaderError, LoaderEvent, TaskError,
    TaskOutcome, TaskSuccess,
};

pub use ego_tree::NodeId;
