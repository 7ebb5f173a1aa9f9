//! Subcommand handlers.
//!
//! Each handler validates its arguments, talks to one API client and
//! renders the result. Nothing here keeps state between invocations.

use std::{
    io::{self, Write},
    path::Path,
};

use clap::CommandFactory;

use crate::{
    cli::{Args, Commands},
    config::Config,
    errors::GptError,
    output,
};

pub mod chats;
pub mod costs;
pub mod edit;
pub mod embed;
pub mod files;
pub mod fine_tune;
pub mod img;
pub mod models;
pub mod run;
pub mod short;

/// Prompt file picked up from the working directory when nothing else is given
pub const INPUTFILE: &str = "Inputfile";

/// Route parsed arguments to their handler.
pub fn dispatch(args: Args) -> Result<(), GptError> {
    if args.version {
        return print_version();
    }

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let config = Config::load()?;

    match command {
        Commands::Run(run_args) => run::run(&run_args, &config),
        Commands::Short(short_args) => short::short(&short_args, &config),
        Commands::Embed(embed_args) => embed::embed(&embed_args, &config),
        Commands::Files { command } => files::files(command, &config),
        Commands::FineTune { command } => fine_tune::fine_tune(command, &config),
        Commands::Models(models_args) => models::models(&models_args, &config),
        Commands::Costs(costs_args) => costs::costs(&costs_args, &config),
        Commands::Chats { command } => chats::chats(command, &config),
        Commands::Edit(edit_args) => edit::edit(&edit_args, &config, args.debug),
        Commands::Img(img_args) => img::img(&img_args, &config),
    }
}

/// Build metadata baked in by `build.rs`
pub fn version_info() -> serde_json::Value {
    serde_json::json!({
        "build_date": env!("GPT_BUILD_DATE"),
        "build_type": env!("GPT_BUILD_TYPE"),
        "version": env!("CARGO_PKG_VERSION"),
    })
}

fn print_version() -> Result<(), GptError> {
    let json = serde_json::to_string_pretty(&version_info())
        .map_err(|e| GptError::Parse(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Text to send to a model, from (in order) the inline flag, a named file,
/// `./Inputfile`, or one line of stdin.
pub(crate) fn load_input_text(
    inline: Option<&str>,
    file: Option<&str>,
) -> Result<String, GptError> {
    let text = match (inline, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(file)) => {
            println!("Reading text from file: '{}'", file);
            output::read_file(file)?
        }
        (None, None) if Path::new(INPUTFILE).is_file() => {
            println!("Found an Inputfile in current working directory!");
            output::read_file(INPUTFILE)?
        }
        (None, None) => read_line_from_stdin("Input: ")?,
    };

    if text.is_empty() {
        return Err(GptError::validation(
            "No input text provided anywhere. Cannot proceed",
        ));
    }
    Ok(text)
}

pub(crate) fn read_line_from_stdin(prompt: &str) -> Result<String, GptError> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Delete every ID, reporting each outcome, and fail at the end if any failed.
///
/// `kind` names one object ("file"), `kinds` the plural used in the
/// summary error ("files").
pub(crate) fn delete_each<F>(
    ids: &[String],
    kind: &str,
    kinds: &'static str,
    mut delete: F,
) -> Result<(), GptError>
where
    F: FnMut(&str) -> Result<bool, GptError>,
{
    let mut failures = 0;

    for id in ids {
        match delete(id) {
            Ok(true) => println!("Success! Deleted {} with ID: {}", kind, id),
            Ok(false) => println!("Warning! Did not delete {} with ID: {}", kind, id),
            Err(e) => {
                eprintln!(
                    "Failed to delete {} with ID: {}. The error was: \"{}\"",
                    kind, id, e
                );
                failures += 1;
            }
        }
    }

    if failures > 0 {
        tracing::debug!(failures, total = ids.len(), "batch delete finished");
        return Err(GptError::BatchDelete(kinds));
    }
    Ok(())
}
