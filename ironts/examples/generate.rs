//! Generates TypeScript from a schema file.
//!
//! Run with: `cargo run --example generate -- <schema.xml> <out-dir> [--typeguards] [--routed]`
//!
//! Set `RUST_LOG=ironts_codegen=debug` to follow each emitted declaration.

use ironts::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let (Some(schema), Some(out_dir)) = (positional.first(), positional.get(1)) else {
        eprintln!("usage: generate <schema.xml> <out-dir> [--typeguards] [--routed]");
        std::process::exit(2);
    };
    let flag = |name: &str| args.iter().any(|a| a == name);

    let config = GeneratorConfig::default()
        .with_typeguards(flag("--typeguards"))
        .with_routed_typemap(flag("--routed"));

    let output = generate_from_file(Path::new(schema.as_str()), &config)?;
    output.write_to(out_dir.as_str())?;

    for file in &output.files {
        println!("[Generate] {}", file.path.display());
    }
    for diagnostic in &output.diagnostics {
        println!("[Generate] {diagnostic}");
    }
    Ok(())
}
