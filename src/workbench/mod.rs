mod batch;
mod ids;
mod record;
mod session;
mod store;

pub use batch::{run_batch, BatchOptions, BatchOutcome};
pub use ids::IdGenerator;
pub use record::{RecordError, RecordStatus, TestRecord};
pub use store::{Stats, SubmitError, Workbench, DEFAULT_GROUP};
