//! Terminal rendering and file persistence helpers.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    os::fd::AsRawFd,
    path::Path,
};

use chrono::DateTime;

use crate::errors::GptError;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator width when stdout is not a terminal
const FALLBACK_WIDTH: usize = 20;

/// Render unix seconds as a UTC datetime, or `-` if out of range.
pub fn datetime(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Number of columns of the terminal stdout is connected to
pub fn terminal_width() -> usize {
    use libc::{ioctl, winsize, TIOCGWINSZ};

    let fd = io::stdout().as_raw_fd();
    let mut ws = winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: the window size pointer is valid for the duration of the call
    if unsafe { ioctl(fd, TIOCGWINSZ, &mut ws) } == -1 || ws.ws_col == 0 {
        return FALLBACK_WIDTH;
    }
    ws.ws_col as usize
}

pub fn separator_line() -> String {
    "-".repeat(terminal_width())
}

pub fn print_separator() {
    println!("{}", separator_line());
}

/// Whether stdin is attached to a terminal
pub fn stdin_is_tty() -> bool {
    nix::unistd::isatty(io::stdin().as_raw_fd()).unwrap_or(false)
}

pub fn read_file(path: impl AsRef<Path>) -> Result<String, GptError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| {
        tracing::debug!("Reading {} failed: {}", path.display(), e);
        GptError::ReadFile {
            path: path.display().to_string(),
        }
    })
}

/// Create or truncate `path` and write `contents` to it.
pub fn write_file(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<(), GptError> {
    let path = path.as_ref();
    let to_err = |e: io::Error| {
        tracing::debug!("Writing {} failed: {}", path.display(), e);
        GptError::WriteFile {
            path: path.display().to_string(),
        }
    };

    let mut file = fs::File::create(path).map_err(to_err)?;
    file.write_all(contents.as_ref()).map_err(to_err)
}

/// Append `contents` to `path`, creating the file and its parent directory.
pub fn append_file(path: impl AsRef<Path>, contents: &str) -> Result<(), GptError> {
    let path = path.as_ref();
    let to_err = |e: io::Error| {
        tracing::debug!("Appending to {} failed: {}", path.display(), e);
        GptError::WriteFile {
            path: path.display().to_string(),
        }
    };

    ensure_parent_dir(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_err)?;
    file.write_all(contents.as_bytes()).map_err(to_err)
}

/// Create the directory `path` will live in.
pub fn ensure_parent_dir(path: &Path) -> Result<(), GptError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| {
                tracing::debug!("Creating {} failed: {}", parent.display(), e);
                GptError::WriteFile {
                    path: path.display().to_string(),
                }
            })
        }
        _ => Ok(()),
    }
}

/// Serialize `value` as pretty JSON into `path`.
pub fn write_json<T: serde::Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), GptError> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| GptError::Parse(e.to_string()))?;
    write_file(path, json)
}
