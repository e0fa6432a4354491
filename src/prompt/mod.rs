pub mod assembler;
pub mod template;

pub use assembler::{assemble, check_required, AssembledPrompt, ANONYMOUS};
pub use template::{render, ANSWER_MARKER};
