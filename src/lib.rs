#[macro_use]
mod macros;

pub mod config;
pub mod error;
pub mod list;
pub mod preferences;
pub mod query;
pub mod recruiters;
pub mod remote;
pub mod types;

pub use config::Config;
pub use error::{ListError, Result};
pub use list::{
    DebouncedInput, DerivedCache, Epoch, GateOutcome, HistoryPolicy, ListController, ListOptions,
    ListSnapshot, Location, MemoryLocation, RequestGate, SharedGate, Toast, ToastLevel, UrlBinding,
};
pub use preferences::{PreferenceStore, Preferences, ViewMode};
pub use query::{
    FilterField, FilterKind, FilterSet, FilterValue, ListState, QueryPairs, SortOrder, decode,
    decode_query, encode, encode_query, to_api_params,
};
pub use recruiters::{Company, Recruiter, RecruiterFilters, recruiter_defaults};
pub use remote::{ApiRequest, HttpLookup, HttpTransport, Lookup, Transport};
pub use types::{Identified, Page, Pagination};
