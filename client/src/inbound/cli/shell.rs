//! Interactive line shell driving a [`LinkBoard`].
//!
//! Commands are read from any async line source and replies are written to
//! any `Write` sink. Identity changes arrive through an account
//! subscription and are announced between replies.

use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use super::command::{Command, EditField, parse_line, split_title};
use super::render::{identity_banner, render_board};
use crate::domain::ports::{IdentityProvider, LinkStore, UserProfileRepository};
use crate::domain::{DomainError, LinkBoard, LinkId, VoteKind};

const PROMPT: &str = "> ";

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print the reply and read the next line.
    Continue(String),
    /// Leave the shell.
    Quit,
}

fn failure(error: &DomainError) -> String {
    format!("! {}\n", error.message())
}

/// The presentation shell.
pub struct Shell<S, P, R> {
    board: Arc<LinkBoard<S, P, R>>,
}

impl<S, P, R> Shell<S, P, R>
where
    S: LinkStore,
    P: IdentityProvider,
    R: UserProfileRepository,
{
    /// Wrap a started or unstarted board.
    pub fn new(board: Arc<LinkBoard<S, P, R>>) -> Self {
        Self { board }
    }

    async fn link_at(&self, index: usize) -> Result<LinkId, String> {
        let snapshot = self.board.snapshot().await;
        index
            .checked_sub(1)
            .and_then(|position| snapshot.links.get(position))
            .map(|link| link.id.clone())
            .ok_or_else(|| format!("! No link numbered {index}. Use `list` to see the board.\n"))
    }

    async fn board_after(&self, outcome: Result<String, DomainError>) -> String {
        match outcome {
            Ok(headline) => {
                let board = render_board(&self.board.snapshot().await);
                format!("{headline}\n{board}")
            }
            Err(err) => failure(&err),
        }
    }

    async fn vote(&self, index: usize, kind: VoteKind) -> String {
        let id = match self.link_at(index).await {
            Ok(id) => id,
            Err(reply) => return reply,
        };
        let outcome = self
            .board
            .vote(&id, kind)
            .await
            .map(|()| "Vote recorded.".to_owned());
        self.board_after(outcome).await
    }

    async fn comment(&self, index: usize, text: &[String]) -> String {
        let id = match self.link_at(index).await {
            Ok(id) => id,
            Err(reply) => return reply,
        };
        let outcome = self
            .board
            .add_comment(&id, &text.join(" "))
            .await
            .map(|()| "Comment added.".to_owned());
        self.board_after(outcome).await
    }

    async fn edit(&self, index: usize, field: EditField, value: &[String]) -> String {
        let id = match self.link_at(index).await {
            Ok(id) => id,
            Err(reply) => return reply,
        };
        let joined = value.join(" ");
        let new_value = Some(joined.as_str());
        let result = match field {
            EditField::Title => self.board.edit_link(&id, new_value, None, None).await,
            EditField::Url => self.board.edit_link(&id, None, new_value, None).await,
            EditField::Description => self.board.edit_link(&id, None, None, new_value).await,
        };
        self.board_after(result.map(|()| "Link updated.".to_owned()))
            .await
    }

    /// Execute one parsed command.
    pub async fn execute(&self, command: Command) -> Step {
        debug!(?command, "shell command");
        let reply = match command {
            Command::List => render_board(&self.board.snapshot().await),
            Command::Refresh => {
                let outcome = self
                    .board
                    .reconcile()
                    .await
                    .map(|()| "Board reloaded.".to_owned());
                self.board_after(outcome).await
            }
            Command::Signup {
                email,
                password,
                nickname,
            } => match self
                .board
                .sign_up(&email, &password, &nickname.join(" "))
                .await
            {
                Ok(identity) => format!("Account created for {}.\n", identity.author_name()),
                Err(err) => failure(&err),
            },
            Command::Signin { email, password } => {
                match self.board.sign_in(&email, &password).await {
                    Ok(identity) => format!("Welcome back, {}.\n", identity.author_name()),
                    Err(err) => failure(&err),
                }
            }
            Command::Signout => match self.board.sign_out().await {
                Ok(()) => "Signed out.\n".to_owned(),
                Err(err) => failure(&err),
            },
            Command::Submit { url, text } => {
                let (title, description) = split_title(&text);
                let outcome = self
                    .board
                    .submit_link(&title, &url, &description)
                    .await
                    .map(|_| format!("Shared \"{title}\"."));
                self.board_after(outcome).await
            }
            Command::Upvote { index } => self.vote(index, VoteKind::Upvote).await,
            Command::Downvote { index } => self.vote(index, VoteKind::Downvote).await,
            Command::Comment { index, text } => self.comment(index, &text).await,
            Command::Edit {
                index,
                field,
                value,
            } => self.edit(index, field, &value).await,
            Command::Quit => return Step::Quit,
        };
        Step::Continue(reply)
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from reading `input` or writing `output`.
    pub async fn run<I, W>(&self, input: I, output: &mut W) -> io::Result<()>
    where
        I: AsyncBufRead + Unpin,
        W: Write,
    {
        let (announce, mut announcements) = mpsc::unbounded_channel();
        let subscription = self.board.accounts().subscribe(move |identity| {
            if let Err(err) = announce.send(identity_banner(identity)) {
                debug!(error = %err, "identity change after the shell closed");
            }
        });
        let mut lines = input.lines();

        write!(output, "{PROMPT}")?;
        output.flush()?;
        loop {
            tokio::select! {
                biased;
                Some(banner) = announcements.recv() => {
                    writeln!(output, "* {banner}")?;
                }
                read = lines.next_line() => {
                    let Some(line) = read? else { break };
                    match parse_line(&line) {
                        Ok(None) => {}
                        Ok(Some(command)) => match self.execute(command).await {
                            Step::Continue(reply) => write!(output, "{reply}")?,
                            Step::Quit => break,
                        },
                        Err(err) => write!(output, "{}", err.render())?,
                    }
                    write!(output, "{PROMPT}")?;
                }
            }
            output.flush()?;
        }

        subscription.unsubscribe();
        writeln!(output)?;
        output.flush()
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
