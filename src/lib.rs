pub mod clipboard;
pub mod config;
pub mod entry;
pub mod errors;
pub mod export;
pub mod gesture;
pub mod logger;
pub mod notify;
pub mod render;
pub mod share_list;

pub use entry::{CardData, ShareEntry};
pub use errors::ShareError;
pub use export::{ExportOutcome, ExportPipeline};
pub use share_list::{ListManager, ShareList, SharedListManager};
