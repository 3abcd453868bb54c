//! Stateful services above the frame codec: reassembly, replay
//! filtering, counter persistence, the command table, and event fan-out.

pub mod command;
pub mod counter_store;
pub mod guard;
pub mod notify;
pub mod reassembler;

pub use command::{CommandRegistry, CommandSpec, SendError, SendRequest, SentInfo};
pub use counter_store::{CounterStore, StoreError};
pub use guard::{GuardPolicy, ReplayGuard, Verdict};
pub use notify::Notifier;
pub use reassembler::{Progress, Reassembler};
