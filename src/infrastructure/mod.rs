pub mod js_executor;
pub mod portal_page;

pub use js_executor::JsExecutor;
pub use portal_page::{PortalPage, SessionFactory};
