//! Kernel module - job infrastructure shared by both processes.

pub mod jobs;

pub use jobs::{
    Dispatcher, DispatcherConfig, FsJobStore, InputFileRef, Job, JobProgress, JobResult,
    JobStatus, JobStore, JobStoreError, OutputRef, WorkerPool, WorkerPoolConfig,
};
