use std::path::Path;

use crate::{
    cli::FilesCommand,
    commands::delete_each,
    config::Config,
    errors::GptError,
    openai::{File, OpenAi},
    output::{self, separator_line},
};

pub fn files(command: Option<FilesCommand>, config: &Config) -> Result<(), GptError> {
    let api = OpenAi::new(config)?;

    match command.unwrap_or(FilesCommand::List { json: false }) {
        FilesCommand::List { json } => list(&api, json),
        FilesCommand::Upload { file, purpose } => upload(&api, &file, &purpose),
        FilesCommand::Delete { ids } => delete_each(&ids, "file", "files", |id| api.delete_file(id)),
    }
}

fn list(api: &OpenAi, json: bool) -> Result<(), GptError> {
    let files = api.list_files()?;
    if json {
        println!("{}", files.raw);
        return Ok(());
    }
    print!("{}", files_table(&files.value.data));
    Ok(())
}

/// Upload `file` and print its new ID
pub(crate) fn upload(api: &OpenAi, file: &str, purpose: &str) -> Result<(), GptError> {
    let id = api.upload_file(Path::new(file), purpose)?;
    println!("Success!\nUploaded file: {}\nWith ID: {}", file, id);
    Ok(())
}

fn files_table(files: &[File]) -> String {
    let sep = separator_line();
    let mut table = format!(
        "{sep}\n{:<30}{:<30}{:<30}{}\n{sep}\n",
        "File ID", "Filename", "Creation time", "Purpose"
    );
    for file in files {
        table.push_str(&format!(
            "{:<30}{:<30}{:<30}{}\n",
            file.id,
            file.filename,
            output::datetime(file.created_at),
            file.purpose
        ));
    }
    table.push_str(&sep);
    table.push('\n');
    table
}
