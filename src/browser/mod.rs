pub mod headless;
pub mod network_tracker;

pub use headless::{ChromiumSession, ChromiumSessionFactory};
pub use network_tracker::NetworkTracker;
