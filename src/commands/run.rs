use colored::{ColoredString, Colorize};

use crate::{
    backend::{self, Completion},
    cli::RunArgs,
    commands::{load_input_text, read_line_from_stdin},
    config::{self, Config, ModelPurpose},
    errors::GptError,
    output::{self, print_separator},
    validation,
};

pub fn run(args: &RunArgs, config: &Config) -> Result<(), GptError> {
    let dump_file = validation::reject_empty(args.file.as_deref(), "No filename provided")?;
    let prompt_file =
        validation::reject_empty(args.read_from_file.as_deref(), "Empty prompt filename")?;
    let temperature = validation::temperature(args.temperature.as_deref())?;
    let model = config.resolve_model(args.model.as_deref(), ModelPurpose::Run, args.use_local)?;

    print_separator();
    let prompt = load_input_text(args.prompt.as_deref(), prompt_file)?;
    if args.prompt.is_none() {
        print_separator();
    }

    let backend = backend::select(args.use_local, config)?;

    let completion = match backend.respond(&prompt, &model, temperature, args.store_completion) {
        Ok(completion) => completion,
        Err(GptError::Embedded { message, raw }) if dump_file.is_some() => {
            // Keep what the server said so it can be inspected later
            tracing::warn!("{}", message);
            if let Some(path) = dump_file {
                println!("Dumping results to '{}'", path);
                output::write_file(path, raw)?;
            }
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}", e);
            return Err(GptError::CannotProceed);
        }
    };

    if let Some(path) = dump_file {
        println!("Dumping results to '{}'", path);
        return output::write_json(path, &completion.dump());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&completion.dump())
            .map_err(|e| GptError::Parse(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    print_usage_statistics(&completion);
    print_separator();

    println!("{} {}", "Results:".bold(), completion.output.green());
    print_separator();

    if args.no_interactive_export || !output::stdin_is_tty() {
        return Ok(());
    }
    export_completion(&completion)?;
    print_separator();
    Ok(())
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Tokens per word. About 100 tokens make up 75 words of English prose.
fn token_ratio(tokens: u64, words: usize) -> Option<f32> {
    if words == 0 {
        return None;
    }
    Some(tokens as f32 / words as f32)
}

fn colorize_ratio(ratio: Option<f32>) -> ColoredString {
    match ratio {
        None => "-".normal(),
        Some(r) if r <= 2.0 => r.to_string().green(),
        Some(r) if r <= 3.0 => r.to_string().yellow(),
        Some(r) => r.to_string().red(),
    }
}

fn print_usage_statistics(completion: &Completion) {
    let wc_prompt = word_count(&completion.input);
    let wc_completion = word_count(&completion.output);

    println!("{}", "Usage:".bold());
    println!("Model: {}", completion.model);
    println!("Source: {}", completion.source);
    println!("RTT: {} s", completion.rtt.as_secs_f32());
    println!();

    println!(
        "Prompt tokens: {}",
        completion.input_tokens.to_string().green()
    );
    println!("Prompt size (words): {}", wc_prompt.to_string().green());
    println!(
        "Ratio: {}",
        colorize_ratio(token_ratio(completion.input_tokens, wc_prompt))
    );
    println!();

    println!(
        "Completion tokens: {}",
        completion.output_tokens.to_string().green()
    );
    println!(
        "Completion size (words): {}",
        wc_completion.to_string().green()
    );
    println!(
        "Ratio: {}",
        colorize_ratio(token_ratio(completion.output_tokens, wc_completion))
    );
}

/// The block appended to `completions.gpt`
fn export_text(completion: &Completion) -> String {
    format!(
        "{{\n> Created at: {} (GMT)\n> Model: {}\n\n> Prompt:\n{}\n\n> Completion:\n{}\n}}\n\n",
        output::datetime(completion.created),
        completion.model,
        completion.input,
        completion.output
    )
}

fn export_completion(completion: &Completion) -> Result<(), GptError> {
    println!("{}", "Export:".bold());

    loop {
        match read_line_from_stdin("> Write reply to file? [y/n]: ")?.trim() {
            "y" => break,
            "n" => {
                println!("> Not exporting response.");
                return Ok(());
            }
            _ => println!("> Invalid choice. Input either 'y' or 'n'!"),
        }
    }

    let path = config::data_dir()?.join(config::COMPLETIONS_FILE_NAME);
    println!("> Writing completion to file {}", path.display());
    output::append_file(&path, &export_text(completion))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::Source;

    fn completion() -> Completion {
        Completion {
            id: None,
            input: "What is 3 + 5?".to_string(),
            output: "3 + 5 = 8".to_string(),
            model: "gpt-4o".to_string(),
            created: 0,
            input_tokens: 8,
            output_tokens: 6,
            rtt: Duration::from_millis(250),
            source: Source::OpenAi,
            raw_response: String::new(),
        }
    }

    #[test]
    fn ratios() {
        assert_eq!(token_ratio(8, 4), Some(2.0));
        assert_eq!(token_ratio(8, 0), None);
        assert_eq!(word_count("  What is\n3 + 5? "), 5);
    }

    #[test]
    fn export_block() {
        let text = export_text(&completion());
        assert!(text.starts_with("{\n> Created at: 1970-01-01 00:00:00 (GMT)\n"));
        assert!(text.contains("> Prompt:\nWhat is 3 + 5?\n"));
        assert!(text.ends_with("> Completion:\n3 + 5 = 8\n}\n\n"));
    }

    #[test]
    fn rejects_bad_flags_before_any_request() {
        let config = Config::default();

        let args = RunArgs {
            temperature: Some("2.5".to_string()),
            ..Default::default()
        };
        assert_eq!(
            run(&args, &config).unwrap_err().to_string(),
            "Temperature must be between 0 and 2"
        );

        let args = RunArgs {
            file: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            run(&args, &config).unwrap_err().to_string(),
            "No filename provided"
        );

        let args = RunArgs {
            read_from_file: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            run(&args, &config).unwrap_err().to_string(),
            "Empty prompt filename"
        );

        let args = RunArgs {
            prompt: Some("hi".to_string()),
            model: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(run(&args, &config).unwrap_err().to_string(), "Model is empty");
    }
}
