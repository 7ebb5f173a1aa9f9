use clap::{error::ErrorKind, Parser};
use gptifier::{cli::Args, commands, logging};

fn main() {
    let args = Args::try_parse().unwrap_or_else(|e| match e.kind() {
        ErrorKind::InvalidSubcommand => {
            eprintln!("Received unknown command. Re-run with -h or --help");
            std::process::exit(1);
        }
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => {
            let _ = e.print();
            std::process::exit(1);
        }
    });

    logging::init_logger(args.debug);

    let res = commands::dispatch(args);
    res.unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
}
