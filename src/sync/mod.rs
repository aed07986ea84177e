//! The sync system takes sync requests from the host app (download forms,
//! cohorts, patients, upload finished forms, etc), runs them one at a time on
//! a dedicated worker thread and reports back on every step as it goes.
//!
//! The actual fetching and storing of data is none of our business: that
//! lives behind the traits in `backend`, which the host app implements. What
//! we own is the ordering of the calls, what happens when one of them fails,
//! and telling the world about it.

pub mod request;
pub mod status;
pub mod backend;
pub mod dispatch;
pub mod service;

pub use self::request::{Credentials, SyncKind, SyncRequest};
pub use self::status::{DispatchReport, ProgressNotice, ProgressState, SyncResult, SyncStatus, SyncStatusEvent, SyncStep};
pub use self::backend::{Authenticator, EventSink, SyncBackend, TimestampStore};
pub use self::dispatch::{Dispatch, SyncDispatcher};
pub use self::service::{run_request, SyncService};
