pub mod eval;
pub mod pipeline;
pub mod scan;

pub use eval::{EvalError, Op, ParsedOperation, calculate};
pub use pipeline::{PipelineError, Report, clear_output, process_file};
