//! Generator command handlers.

use anyhow::Context;
use daq_schema::SchemaRegistry;
use readout_confgen::{
    render_blocks, render_document, ConfigGenerator, FakeReadoutArgs, FakeReadoutGenerator,
    MiniDaqArgs, MiniDaqGenerator, OutputArgs,
};
use std::path::Path;

/// Load the plugin schema, or fall back to the built-in plugin set.
pub fn load_registry(schema: Option<&Path>) -> anyhow::Result<SchemaRegistry> {
    match schema {
        Some(path) => {
            tracing::info!("Loading plugin schema from {:?}", path);
            SchemaRegistry::from_file(path)
                .with_context(|| format!("Failed to load plugin schema from {path:?}"))
        }
        None => Ok(SchemaRegistry::builtin()),
    }
}

/// Generate one document and write it to `json_file`.
pub fn run_generate<G: ConfigGenerator>(
    generator: &G,
    output: &OutputArgs,
    json_file: &Path,
) -> anyhow::Result<()> {
    let registry = load_registry(output.schema.as_deref())?;
    let sequence = generator.generate(&registry)?;

    if output.echo {
        for block in render_blocks(&sequence)? {
            println!("{block}");
        }
    }

    let document = render_document(&sequence)?;
    if let Some(parent) = json_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {parent:?}"))?;
    }
    std::fs::write(json_file, document)
        .with_context(|| format!("Failed to write {json_file:?}"))?;

    println!("'{}' generation completed.", json_file.display());
    Ok(())
}

/// Run the fake-readout command.
pub fn run_fake_readout(args: FakeReadoutArgs) -> anyhow::Result<()> {
    let generator = FakeReadoutGenerator::new((&args).into());
    tracing::debug!("Default output name: {}", generator.default_filename());
    run_generate(&generator, &args.output, &args.json_file)
}

/// Run the minidaq command.
pub fn run_minidaq(args: MiniDaqArgs) -> anyhow::Result<()> {
    let generator = MiniDaqGenerator::new((&args).into());
    tracing::debug!("Default output name: {}", generator.default_filename());
    run_generate(&generator, &args.output, &args.json_file)
}
