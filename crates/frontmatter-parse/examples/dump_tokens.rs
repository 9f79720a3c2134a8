use std::io::Read;

use frontmatter_parse::{FrontMatterBlock, Tokenizer, decode};

fn main() {
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source).unwrap();

    let Some(block) = FrontMatterBlock::find(&source) else {
        eprintln!("no front matter block found");
        return;
    };

    println!("=== Tokens ===");
    for tok in Tokenizer::for_span(&source, block.content) {
        println!("{:?}", tok);
    }

    println!("\n=== Structured tokens ===");
    let (tokens, errors) = decode(block.tokenize(&source));
    for token in tokens.iter().filter(|t| !t.is_trivia()) {
        println!("{:?}", token);
    }
    for error in errors {
        println!("error: {} at {}", error, error.span);
    }
}
