pub mod csv_loader;

pub use csv_loader::{load_jobs, parse_jobs, LIGAND_COLUMNS, RECEPTOR_COLUMN};
