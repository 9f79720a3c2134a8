use std::io::Read;

use frontmatter_header::{Header, HeaderOptions, RunOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source).unwrap();

    let Some(mut header) = Header::from_source(&source, HeaderOptions::default()) else {
        eprintln!("no front matter block found");
        return;
    };

    let outcome = header.run().await;
    assert_eq!(outcome, RunOutcome::Settled);

    for record in header.records() {
        let accepted: Vec<_> = record.result.accepted.iter().collect();
        println!("{}: {:?} (valid: {})", record.name, accepted, record.result.is_valid());
    }
    for diagnostic in header.diagnostics() {
        eprint!("{}", diagnostic.render("<stdin>", &source));
    }
}
