pub mod job;
pub mod loaders;
pub mod result;

pub use job::{expand_path, JobRecord, LigandPayload};
pub use loaders::{load_jobs, parse_jobs};
pub use result::{ResultRecord, RESULT_HEADER, SUBMISSION_FAILED};
