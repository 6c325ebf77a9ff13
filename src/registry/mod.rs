//! Session registry and admission gate
//!
//! The registry is the only concurrently-shared mutable state in the frame
//! path: an ordered list of [`SessionHandle`]s behind a single lock, plus the
//! wake handle that resumes the idle scheduler.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<SessionRegistry>
//!                   ┌───────────────────────────┐
//!   admit(handle) ─►│ sessions: Mutex<Vec<..>>  │◄─ broadcast_sweep(frame)
//!   (cap checked    │ capacity: usize           │   (lock held for the
//!    and inserted   │ wake: Notify              │    whole sweep; dead
//!    in one lock)   └───────────────────────────┘    handles removed in
//!                                                    iteration order)
//! ```
//!
//! `admit` performs the capacity check and the insert under one lock
//! acquisition, so two near-simultaneous requests cannot both pass the check.
//! Removal happens only inside the sweep, never from the consumer side, so
//! iteration can never be invalidated underneath the scheduler.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::SessionHandle;
pub use error::AdmissionError;
pub use store::{SessionRegistry, SweepOutcome};
