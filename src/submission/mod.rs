pub mod honeypot;
pub mod metadata;
pub mod parser;
pub mod record;

pub use metadata::ClientContext;
pub use record::{RecordMetadata, SubmissionRecord};
