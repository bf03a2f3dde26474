pub mod error;
pub mod part;
pub mod request;
pub mod status;
pub mod terminal_set;
pub mod worker_handle;

pub use error::SimError;
pub use part::Part;
pub use request::Request;
pub use status::{RequestStatus, RobotStatus};
pub use terminal_set::TerminalSet;
pub use worker_handle::{WorkerHandle, WorkerSnapshot};
