// SPDX-License-Identifier: MIT

//! The scheduling engine: task pool, job dispatch, and event ingestion
//! (spec.md §4.5-§4.15). Everything here runs on the single-threaded main
//! loop; subprocess/SSH execution is delegated to `cylc-adapters`.

pub mod clean;
pub mod errors;
pub mod job_manager;
pub mod remote_manager;
pub mod scheduler;
pub mod task_events_manager;
pub mod task_pool;

pub use clean::{CleanRequest, SymlinkDirs, TargetOutcome};
pub use errors::{
    CleanError, FatalError, PersistenceError, PlatformLookupError, ProtocolError, ReceivedIgnored,
    TransportError,
};
pub use job_manager::{SubmitOutcome, SubmitResolution};
pub use remote_manager::{HostSelection, RemoteInitState, RemoteManager, RemoteMgmtError};
pub use scheduler::{Inbox, IncomingMessage, Scheduler, TickOutcome};
pub use task_events_manager::{MessageOutcome, Severity, TaskEventsManager, TimeoutKind};
pub use task_pool::{RunaheadLimit, SuicideEvent, TaskId, TaskPool};
