pub mod dispatcher;
pub mod exporter;
pub mod header;
pub mod reader;
pub mod template;
pub mod variation;

pub use dispatcher::Dispatcher;
pub use reader::{SourceFormat, SourceWorkbook};
pub use variation::VariationService;
