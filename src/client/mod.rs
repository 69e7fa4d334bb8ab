//! Counter client: reconciles the realtime done set with paginated beads.

pub mod fetcher;
pub mod pagination;
pub mod reconcile;
mod scheduler;
pub mod session;
pub mod view;
mod worker;

pub use fetcher::{
    FetchError, HttpPageFetcher, LocalPageFetcher, PageFetcher, RetryPolicy, RetryingFetcher,
};
pub use pagination::{ControlState, Direction, FetchKind, FetchRequest, PaginationDriver, QueryStatus};
pub use reconcile::{MarkOutcome, RealtimeOutcome, ReconcileKey, Reconciler, TimerOutcome};
pub use scheduler::{Debouncer, TimerFired};
pub use session::{
    Command, Notice, SessionConfig, SessionError, SessionEvent, SessionHandle, SessionView,
    spawn_session,
};
pub use view::{BeadView, PageView, RenderModel, merged_view};
