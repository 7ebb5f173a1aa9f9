use crate::{
    backend,
    cli::ShortArgs,
    config::{Config, ModelPurpose},
    errors::GptError,
    validation,
};

/// Create a response without any decoration. Handy for scripts and editors.
pub fn short(args: &ShortArgs, config: &Config) -> Result<(), GptError> {
    let prompt = match args.prompt.as_deref() {
        Some(prompt) if !prompt.is_empty() => prompt,
        _ => return Err(GptError::validation("Prompt is empty")),
    };
    let temperature = validation::temperature(args.temperature.as_deref())?;
    let model =
        config.resolve_model(args.model.as_deref(), ModelPurpose::Short, args.use_local)?;

    let completion = backend::select(args.use_local, config)?.respond(
        prompt,
        &model,
        temperature,
        args.store_completion,
    )?;

    if args.json {
        println!("{}", completion.raw_response);
    } else {
        println!("{}", completion.output);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn prompt_is_required() {
        let config = Config::default();
        for prompt in [None, Some(String::new())] {
            let args = ShortArgs {
                prompt,
                ..Default::default()
            };
            assert_eq!(
                short(&args, &config).unwrap_err().to_string(),
                "Prompt is empty"
            );
        }
    }

    #[test]
    fn temperature_checked_before_model() {
        let args = ShortArgs {
            prompt: Some("What is 2 + 2?".to_string()),
            temperature: Some("foobar".to_string()),
            ..Default::default()
        };
        assert_eq!(
            short(&args, &Config::default()).unwrap_err().to_string(),
            "Failed to convert 'foobar' to float"
        );
    }

    #[test]
    fn surfaces_provider_error() {
        let mut server = Server::new();
        server
            .mock("POST", "/responses")
            .with_status(400)
            .with_body(r#"{"error":{"message":"Invalid value for 'model': 'foobar'."}}"#)
            .create();

        let mut config = Config::default();
        config.openai.base_url = server.url();
        config.credentials.api_key = Some("sk-test".to_string());

        let args = ShortArgs {
            prompt: Some("What is 2 + 2?".to_string()),
            model: Some("foobar".to_string()),
            ..Default::default()
        };
        assert_eq!(
            short(&args, &config).unwrap_err().to_string(),
            "Invalid value for 'model': 'foobar'."
        );
    }
}
