use std::path::PathBuf;

use crate::{
    backend,
    cli::EmbedArgs,
    commands::load_input_text,
    config::{self, Config, ModelPurpose},
    errors::GptError,
    output::{self, print_separator},
    validation,
};

/// Embed some text and write the vector to a JSON file.
pub fn embed(args: &EmbedArgs, config: &Config) -> Result<(), GptError> {
    let input_file =
        validation::reject_empty(args.read_from_file.as_deref(), "Empty input filename")?;
    let output_file = validation::reject_empty(args.output_file.as_deref(), "No filename provided")?;
    let model =
        config.resolve_model(args.model.as_deref(), ModelPurpose::Embed, args.use_local)?;

    let output_path = match output_file {
        Some(path) => PathBuf::from(path),
        None => config::data_dir()?.join(config::EMBEDDINGS_FILE_NAME),
    };

    print_separator();
    let input = load_input_text(args.input.as_deref(), input_file)?;

    let embedding = backend::select(args.use_local, config)?.embed(&input, &model)?;

    println!("Dumping embedding to '{}'", output_path.display());
    if output_file.is_none() {
        output::ensure_parent_dir(&output_path)?;
    }
    output::write_json(&output_path, &embedding)?;
    print_separator();
    Ok(())
}
