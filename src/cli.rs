use clap::{Parser, Subcommand};

/// Default purpose attached to uploaded files
pub const DEFAULT_FILE_PURPOSE: &str = "fine-tune";

/// CLI for `gpt`
///
/// Flags whose values are validated (temperatures, limits, days, models,
/// file names) are kept as raw strings here so that an empty value can be
/// told apart from a missing one.
#[derive(Debug, Parser)]
#[command(
    name = "gpt",
    author,
    about = "Query OpenAI or a local Ollama server from the command line",
    disable_version_flag = true
)]
pub struct Args {
    /// Print build information as JSON
    #[arg(short = 'v', long = "version")]
    pub version: bool,
    /// Log requests and other diagnostics to stderr
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// GPTifier subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a response to a prompt and report usage statistics
    Run(RunArgs),
    /// Create a response and print only the output
    Short(ShortArgs),
    /// Compute an embedding for some text
    Embed(EmbedArgs),
    /// Manage uploaded files. Lists files when no subcommand is given
    Files {
        #[command(subcommand)]
        command: Option<FilesCommand>,
    },
    /// Manage fine-tuning jobs and fine-tuned models
    FineTune {
        #[command(subcommand)]
        command: FineTuneCommand,
    },
    /// List available models
    Models(ModelsArgs),
    /// Report organization costs (requires an admin key)
    Costs(CostsArgs),
    /// Manage stored chat completions. Lists them when no subcommand is given
    Chats {
        #[command(subcommand)]
        command: Option<ChatsCommand>,
    },
    /// Rewrite a file according to instructions
    Edit(EditArgs),
    /// Generate an image from a prompt file
    Img(ImgArgs),
}

#[derive(Debug, Default, clap::Args)]
pub struct RunArgs {
    /// Prompt to send
    #[arg(short, long)]
    pub prompt: Option<String>,
    /// Read the prompt from a file
    #[arg(short, long)]
    pub read_from_file: Option<String>,
    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,
    /// Sampling temperature between 0 and 2
    #[arg(short, long, allow_hyphen_values = true)]
    pub temperature: Option<String>,
    /// Dump the completion as JSON to this file
    #[arg(short = 'o', long = "file", visible_alias = "dump")]
    pub file: Option<String>,
    /// Print the completion as JSON
    #[arg(short, long)]
    pub json: bool,
    /// Use the local Ollama server
    #[arg(short = 'l', long)]
    pub use_local: bool,
    /// Do not offer to save the reply
    #[arg(short = 'u', long)]
    pub no_interactive_export: bool,
    /// Store the completion on OpenAI's servers
    #[arg(short, long)]
    pub store_completion: bool,
}

#[derive(Debug, Default, clap::Args)]
pub struct ShortArgs {
    /// Prompt to send
    pub prompt: Option<String>,
    /// Print the raw response
    #[arg(short, long)]
    pub json: bool,
    /// Sampling temperature between 0 and 2
    #[arg(short, long, allow_hyphen_values = true)]
    pub temperature: Option<String>,
    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,
    /// Use the local Ollama server
    #[arg(short = 'l', long)]
    pub use_local: bool,
    /// Store the completion on OpenAI's servers
    #[arg(short, long)]
    pub store_completion: bool,
}

#[derive(Debug, Default, clap::Args)]
pub struct EmbedArgs {
    /// Text to embed
    #[arg(short, long)]
    pub input: Option<String>,
    /// Read the text to embed from a file
    #[arg(short, long)]
    pub read_from_file: Option<String>,
    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,
    /// Where to write the embedding (default ~/.gptifier/embeddings.gpt)
    #[arg(short, long)]
    pub output_file: Option<String>,
    /// Use the local Ollama server
    #[arg(short = 'l', long)]
    pub use_local: bool,
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List uploaded files
    List {
        /// Print the raw response
        #[arg(short, long)]
        json: bool,
    },
    /// Upload a file
    Upload {
        file: String,
        /// Intended purpose of the file
        #[arg(long, default_value = DEFAULT_FILE_PURPOSE)]
        purpose: String,
    },
    /// Delete one or more files
    Delete {
        #[arg(required = true, value_name = "FILE-ID")]
        ids: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum FineTuneCommand {
    /// Upload a training file
    UploadFile { file: String },
    /// Start a fine-tuning job
    CreateJob {
        /// ID of an uploaded training file
        #[arg(short = 'f', long)]
        file_id: Option<String>,
        /// Base model to fine-tune
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Delete a fine-tuned model
    DeleteModel {
        #[arg(value_name = "MODEL-ID")]
        model_id: String,
    },
    /// List fine-tuning jobs
    ListJobs {
        /// Print the raw response
        #[arg(short, long)]
        json: bool,
        /// How many jobs to show
        #[arg(short, long, allow_hyphen_values = true)]
        limit: Option<String>,
    },
}

#[derive(Debug, Default, clap::Args)]
pub struct ModelsArgs {
    /// Show user-owned models instead of OpenAI's
    #[arg(short, long)]
    pub user: bool,
    /// Print the raw response
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Default, clap::Args)]
pub struct CostsArgs {
    /// Look-back window in days (1 to 60)
    #[arg(short, long, allow_hyphen_values = true)]
    pub days: Option<String>,
    /// Print the raw response
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum ChatsCommand {
    /// List stored chat completions
    List {
        /// Print the raw response
        #[arg(short, long)]
        json: bool,
        /// How many completions to show
        #[arg(short, long, allow_hyphen_values = true)]
        limit: Option<String>,
    },
    /// Delete one or more stored chat completions
    Delete {
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },
}

#[derive(Debug, Default, clap::Args)]
pub struct EditArgs {
    /// File to edit
    pub file: Option<String>,
    /// File containing editing instructions
    #[arg(short, long = "instructions", value_name = "FILE")]
    pub instructions_file: Option<String>,
    /// Editing rule given inline
    #[arg(short, long)]
    pub rule: Option<String>,
    /// Write the edited code here instead of stdout
    #[arg(short, long = "output", value_name = "FILE")]
    pub output_file: Option<String>,
    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,
}

#[derive(Debug, Default, clap::Args)]
pub struct ImgArgs {
    /// File containing the image prompt
    pub prompt_file: Option<String>,
    /// Request an HD image
    #[arg(short = 'q', long)]
    pub hd: bool,
    /// Generate hyper-real, dramatic images
    #[arg(short, long)]
    pub vivid: bool,
}
