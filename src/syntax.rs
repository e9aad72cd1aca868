mod errors;
mod parser;
mod tokenizer;
mod tree;

pub use errors::{ParseError, ParseErrorKind};
pub use parser::Parser;
pub use tokenizer::*;
pub use tree::*;
