//! Shell command grammar.
//!
//! Each input line is split on whitespace and parsed by clap without a
//! binary name. Free-text arguments swallow the rest of the line.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "sharelinks",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "Commands:\n{subcommands}"
)]
struct CommandLine {
    #[command(subcommand)]
    command: Command,
}

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the board.
    List,
    /// Reload every link from the store.
    Refresh,
    /// Create an account: signup <email> <password> <nickname...>
    Signup {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
        /// Nickname shown on shared links.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        nickname: Vec<String>,
    },
    /// Sign in: signin <email> <password>
    Signin {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },
    /// Sign out.
    Signout,
    /// Share a link: submit <url> <title...> [| description]
    Submit {
        /// Address of the shared page.
        url: String,
        /// Title, optionally followed by `|` and a description.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Upvote the n-th listed link.
    Upvote {
        /// Position on the board, starting at 1.
        index: usize,
    },
    /// Downvote the n-th listed link.
    Downvote {
        /// Position on the board, starting at 1.
        index: usize,
    },
    /// Comment on the n-th listed link.
    Comment {
        /// Position on the board, starting at 1.
        index: usize,
        /// Comment text.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Change one field of a link you shared.
    Edit {
        /// Position on the board, starting at 1.
        index: usize,
        /// Field to change.
        field: EditField,
        /// New value; may be empty for the description.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Leave the shell.
    #[command(visible_alias = "exit")]
    Quit,
}

/// Editable link field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EditField {
    /// Link title.
    Title,
    /// Link address.
    Url,
    /// Free-text description.
    Description,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns the clap error for unknown commands or bad arguments; its
/// rendering doubles as help output.
pub fn parse_line(line: &str) -> Result<Option<Command>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    CommandLine::try_parse_from(words).map(|parsed| Some(parsed.command))
}

/// Split submit text into title and description at the first `|`.
pub fn split_title(words: &[String]) -> (String, String) {
    let joined = words.join(" ");
    joined.split_once('|').map_or_else(
        || (joined.trim().to_owned(), String::new()),
        |(title, description)| (title.trim().to_owned(), description.trim().to_owned()),
    )
}
