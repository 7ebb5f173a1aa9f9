use std::io::{self, Write};

use colored::Colorize;
use serde::Deserialize;

use crate::{
    backend::{Backend, Completion},
    cli::EditArgs,
    config::{Config, ModelPurpose},
    errors::GptError,
    openai::OpenAi,
    output::{self, print_separator},
    validation,
};

/// What the model is asked to return
#[derive(Debug, Deserialize, PartialEq)]
struct EditedCode {
    code: String,
    description: String,
}

pub fn edit(args: &EditArgs, config: &Config, debug: bool) -> Result<(), GptError> {
    let Some(input_file) = args.file.as_deref().filter(|f| !f.is_empty()) else {
        return Err(GptError::validation(
            "No file to edit provided. Cannot proceed",
        ));
    };
    let output_file =
        validation::reject_empty(args.output_file.as_deref(), "No filename provided")?;

    let instructions = match (args.rule.as_deref(), args.instructions_file.as_deref()) {
        (Some(rule), _) if !rule.is_empty() => {
            println!("Read instructions from CLI");
            rule.to_string()
        }
        (_, Some(file)) if !file.is_empty() => {
            let text = output::read_file(file)?;
            println!("Read instructions from: {}", file);
            text
        }
        _ => {
            return Err(GptError::validation(
                "No instructions file or rule provided. Cannot proceed",
            ))
        }
    };

    let model = config.resolve_model(args.model.as_deref(), ModelPurpose::Edit, false)?;
    let input_code = output::read_file(input_file)?;
    let prompt = build_prompt(&instructions, &input_code);

    print!("{} -> ", input_file);
    io::stdout().flush()?;

    let completion = match request_edit(config, &prompt, &model) {
        Ok(completion) => completion,
        Err(e) => {
            println!("?");
            return Err(e);
        }
    };

    match output_file {
        Some(path) => println!("{}\nComplete!", path),
        None => println!("stdout"),
    }

    if debug {
        print_separator();
        println!("The prompt was:");
        print!("{}", prompt.blue());
        print_separator();
        println!("The completion was:");
        println!("{}", completion.output.green());
        return Ok(());
    }

    let edited = parse_edit(&completion.output)?;

    if let Some(path) = output_file {
        output::write_file(path, &edited.code)?;
    } else {
        print_separator();
        println!("The updated code is:");
        println!("{}", format!("```\n{}\n```", edited.code).green());
    }

    print_separator();
    println!("A description of the changes:");
    println!("{}", edited.description.green());
    Ok(())
}

fn request_edit(config: &Config, prompt: &str, model: &str) -> Result<Completion, GptError> {
    OpenAi::new(config)?.respond(prompt, model, validation::DEFAULT_TEMPERATURE, false)
}

fn build_prompt(instructions: &str, input_code: &str) -> String {
    let mut prompt = String::from("I am editing some code. Apply the following instructions:\n");
    prompt.push_str(&format!("```plaintext\n{}\n```\n", instructions));
    prompt.push_str(&format!(
        "To the following code:\n```\n{}\n```\n",
        input_code
    ));
    prompt.push_str(
        "Please return the code edits in a JSON format with keys \"code\" and \"description.\" \
         For example:\n\
         {\n  \"code\": \"Your updated code here\",\n  \"description\": \"A brief explanation of the changes\",\n}\n",
    );
    prompt
}

/// The JSON object in a completion, which some models wrap in a ```json fence.
fn extract_json(completion: &str) -> Result<String, GptError> {
    let trimmed = completion.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed.to_string());
    }

    let mut raw_json = String::new();
    let mut in_fence = false;

    for line in completion.lines() {
        match line.trim_end() {
            "```json" => in_fence = true,
            "```" => in_fence = false,
            line if in_fence => raw_json.push_str(line),
            _ => {}
        }
    }

    if in_fence {
        return Err(GptError::Malformed(
            "Closing triple backticks not found. Raw JSON might be malformed".to_string(),
        ));
    }
    Ok(raw_json)
}

fn parse_edit(completion: &str) -> Result<EditedCode, GptError> {
    let raw_json = extract_json(completion)?;
    if raw_json.is_empty() {
        return Err(GptError::Malformed(
            "JSON with code and description is empty. Cannot proceed".to_string(),
        ));
    }
    serde_json::from_str(&raw_json)
        .map_err(|e| GptError::Malformed(format!("Failed to parse JSON: {}", e)))
}
