pub mod job;
pub mod pool;
pub mod queue;

pub use job::Job;
pub use pool::WorkerPool;
pub use queue::{JobQueue, QueueMessage};
