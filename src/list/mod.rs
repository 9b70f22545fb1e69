pub mod controller;
pub mod debounce;
pub mod derived;
pub mod gate;
pub mod toast;
pub mod url_binding;

pub use controller::{ListController, ListOptions, ListSnapshot};
pub use debounce::DebouncedInput;
pub use derived::DerivedCache;
pub use gate::{Epoch, GateOutcome, RequestGate, SharedGate};
pub use toast::{Toast, ToastLevel};
pub use url_binding::{Change, HistoryPolicy, Location, MemoryLocation, UrlBinding};
