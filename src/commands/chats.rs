use crate::{
    cli::ChatsCommand,
    commands::delete_each,
    config::Config,
    errors::GptError,
    openai::{ChatCompletion, OpenAi},
    output::{self, separator_line},
    validation,
};

pub fn chats(command: Option<ChatsCommand>, config: &Config) -> Result<(), GptError> {
    let command = command.unwrap_or(ChatsCommand::List {
        json: false,
        limit: None,
    });

    match command {
        ChatsCommand::List { json, limit } => {
            let limit = validation::limit(limit.as_deref())?;
            list(&OpenAi::new(config)?, json, limit)
        }
        ChatsCommand::Delete { ids } => {
            let api = OpenAi::new(config)?;
            delete_each(&ids, "chat completion", "chats", |id| {
                api.delete_chat_completion(id)
            })
        }
    }
}

fn list(api: &OpenAi, json: bool, limit: i64) -> Result<(), GptError> {
    let chats = api.list_chat_completions(limit)?;
    if json {
        println!("{}", chats.raw);
        return Ok(());
    }

    let mut chats = chats.value.data;
    chats.sort_by_key(|chat| chat.created);
    print!("{}", chats_table(&chats));
    Ok(())
}

/// Newlines would break the table's rows
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn chats_table(chats: &[ChatCompletion]) -> String {
    let sep = separator_line();
    let mut table = format!(
        "{sep}\n{:<25}{:<40}{:<35}{}\n{sep}\n",
        "Created at", "Chat completion ID", "Prompt", "Completion"
    );
    for chat in chats {
        table.push_str(&format!(
            "{:<25}{:<40}{:<35}{}\n",
            output::datetime(chat.created),
            chat.id,
            one_line(chat.prompt()),
            one_line(chat.completion())
        ));
    }
    table.push_str(&sep);
    table.push('\n');
    table
}
