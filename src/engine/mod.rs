// Batch encoding engine - independent of the terminal surface

pub mod batch;
pub mod core;
pub mod hardware;
pub mod worker;

pub use batch::{
    BatchDisplay, BatchOrchestrator, BatchOutcome, BatchPlan, BatchResult, BatchSettings,
    ConfigError, FailedJob,
};
pub use core::*;
pub use hardware::{BackendAvailability, EncoderBackend};
pub use worker::{WorkerMessage, WorkerPool};
