pub mod ligand_resolver;
pub mod progress;
pub mod run_log;
pub mod token_extractor;

pub use ligand_resolver::{looks_like_sequence, resolve_ligand};
pub use progress::{progress_line, ProgressReporter};
pub use run_log::RunLogWriter;
pub use token_extractor::extract_token;
