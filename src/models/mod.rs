pub mod batch_log;
pub mod grid;
pub mod loaders;
pub mod selection;
pub mod target;
pub mod template;

pub use batch_log::{BatchLog, PromptRecord, RunOutcome};
pub use grid::{Cell, SourceGrid};
pub use loaders::{load_batch_definition, BatchDefinition, HeaderSpec};
pub use selection::{HeaderKind, HeaderSelection};
pub use target::{LlmResponse, LlmTarget, Transport};
pub use template::{Prompt, QueryTemplate, TemplateSet, DEFAULT_PLACEHOLDER};
