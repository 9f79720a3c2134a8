//! A tokenizer for front matter metadata blocks

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::Tokenizer;

mod block;
pub use block::FrontMatterBlock;
