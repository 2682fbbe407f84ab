// Mailsift - email extraction job service.
//
// An HTTP gateway accepts document uploads and records each request as a
// durable job; a separate worker process claims jobs, runs the extraction
// scanners over every input file, and writes downloadable artifacts.
// kernel/jobs holds the shared job infrastructure both processes use.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
