use std::sync::LazyLock;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::command::{Cmd, CommandResult};
use super::vfs::VirtualFilesystem;
use super::{Shell, HOME_DIR, HOSTNAME, USER};

static SHELL: LazyLock<Shell> = LazyLock::new(Shell::new);

const WELCOME_BANNER: &str = "Welcome to the secure system. Connection established.";
const WELCOME_HINT: &str = "Type commands to navigate and complete your mission.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Command,
    Output,
    Error,
    Success,
    /// Interactive prompt echo, rendered by clients that show the prompt inline.
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputLine {
    pub content: String,
    pub kind: OutputKind,
    pub timestamp: DateTime<Local>,
}

/// `user@hackbox:<dir>$`, with the home directory shown as `~`.
pub fn prompt_for(current_directory: &str) -> String {
    let dir = if current_directory == HOME_DIR {
        "~"
    } else {
        current_directory
    };
    format!("{USER}@{HOSTNAME}:{dir}$")
}

/// One interactive shell: prompt, history, rendered output log and the
/// filesystem snapshot currently in force.
#[derive(Debug, Clone)]
pub struct TerminalSession {
    prompt: String,
    history: Vec<String>,
    history_index: usize,
    output: Vec<OutputLine>,
    connected: bool,
    filesystem: VirtualFilesystem,
}

impl TerminalSession {
    pub fn new(filesystem: VirtualFilesystem) -> Self {
        let mut session = Self {
            prompt: prompt_for(filesystem.current_directory()),
            history: Vec::new(),
            history_index: 0,
            output: Vec::new(),
            connected: true,
            filesystem,
        };
        session.add_output_line(WELCOME_BANNER, OutputKind::Success);
        session.add_output_line(WELCOME_HINT, OutputKind::Output);
        session
    }

    /// Runs one line through the shell and records it in history and the log.
    pub fn process(&mut self, input: &str) -> CommandResult {
        self.push_history(input);
        let command_line = format!("{} {}", self.prompt, input);
        self.add_output_line(command_line, OutputKind::Command);

        let result = SHELL.execute(input, &self.filesystem);
        if let Some(next) = result.new_filesystem() {
            self.filesystem = next.clone();
        }
        self.prompt = prompt_for(self.filesystem.current_directory());

        let is_clear = input
            .split_whitespace()
            .next()
            .is_some_and(|name| Cmd::from(name) == Cmd::Clear);
        if is_clear && result.success() {
            self.clear_output();
        } else if !result.output().is_empty() {
            let kind = if result.success() {
                OutputKind::Output
            } else {
                OutputKind::Error
            };
            self.add_output_line(result.output(), kind);
        }

        result
    }

    fn push_history(&mut self, input: &str) {
        let repeated = self.history.last().is_some_and(|last| last == input);
        if !input.trim().is_empty() && !repeated {
            self.history.push(input.to_string());
            self.filesystem = self.filesystem.with_history_entry(input);
        }
        self.history_index = self.history.len();
    }

    pub fn add_output_line(&mut self, content: impl Into<String>, kind: OutputKind) {
        self.output.push(OutputLine {
            content: content.into(),
            kind,
            timestamp: Local::now(),
        });
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Steps the history cursor back one entry and returns it.
    pub fn recall_previous(&mut self) -> Option<&str> {
        if self.history_index == 0 {
            return self.history.first().map(String::as_str);
        }
        self.history_index -= 1;
        self.history.get(self.history_index).map(String::as_str)
    }

    /// Steps the history cursor forward. Walking past the newest entry parks
    /// the cursor at the end and yields nothing.
    pub fn recall_next(&mut self) -> Option<&str> {
        if self.history_index + 1 >= self.history.len() {
            self.history_index = self.history.len();
            return None;
        }
        self.history_index += 1;
        self.history.get(self.history_index).map(String::as_str)
    }

    pub fn search_history(&self, prefix: &str) -> Vec<&str> {
        self.history
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn history_index(&self) -> usize {
        self.history_index
    }

    pub fn output(&self) -> &[OutputLine] {
        &self.output
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn filesystem(&self) -> &VirtualFilesystem {
        &self.filesystem
    }
}
