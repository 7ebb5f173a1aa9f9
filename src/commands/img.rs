use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    cli::ImgArgs,
    config::Config,
    errors::GptError,
    openai::OpenAi,
    output::{self, print_separator},
};

/// Generate an image and save it as `<created>.png` in the working directory.
pub fn img(args: &ImgArgs, config: &Config) -> Result<(), GptError> {
    let Some(prompt_file) = args.prompt_file.as_deref().filter(|f| !f.is_empty()) else {
        return Err(GptError::validation(
            "No prompt file provided. Cannot proceed",
        ));
    };
    let prompt = output::read_file(prompt_file)?;

    let quality = if args.hd { "hd" } else { "standard" };
    let style = if args.vivid { "vivid" } else { "natural" };
    let model = config.openai.model_img.as_str();

    print_separator();
    println!("Prompt: {}", prompt.trim_end());
    println!("Model: {}\nQuality: {}\nStyle: {}", model, quality, style);
    print_separator();

    let image = OpenAi::new(config)?.create_image(model, &prompt, quality, style)?;

    if let Some(revised) = &image.revised_prompt {
        println!("Revised prompt: {}", revised);
    }

    let bytes = STANDARD
        .decode(image.b64_json.as_bytes())
        .map_err(|e| GptError::Unpack(format!("image is not valid base64: {}", e)))?;

    let path = image_path(image.created);
    output::write_file(&path, bytes)?;
    println!("Saved image to '{}'", path.display());
    Ok(())
}

fn image_path(created: i64) -> PathBuf {
    PathBuf::from(format!("{}.png", created))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_file_required() {
        let err = img(&ImgArgs::default(), &Config::default()).unwrap_err();
        assert_eq!(err.to_string(), "No prompt file provided. Cannot proceed");

        let args = ImgArgs {
            prompt_file: Some("/a/b/c/prompt.txt".to_string()),
            ..Default::default()
        };
        let err = img(&args, &Config::default()).unwrap_err();
        assert_eq!(err.to_string(), "Could not open file '/a/b/c/prompt.txt'");
    }

    #[test]
    fn named_after_creation_time() {
        assert_eq!(image_path(1700000000), PathBuf::from("1700000000.png"));
    }
}
