pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod io;
pub mod memory;
pub mod process;
pub mod registry;
pub mod scheduler;
pub mod translation;
pub mod workload;

// Re-export commonly used items for convenience
pub use config::Config;
pub use error::{Result, SimError};
pub use event::{Event, EventKind, EventLog};
pub use process::{Instruction, Pcb, ProcessId, ProcessStatus};
pub use scheduler::{Scheduler, SliceEnd, StepOutcome};
pub use translation::{address_to_page_number, VirtualAddress};
