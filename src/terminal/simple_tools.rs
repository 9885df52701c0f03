use std::sync::LazyLock;

use regex::Regex;

use super::command::{CommandResult, Executable};
use super::vfs::VirtualFilesystem;

// content, optional whitespace, '>', optional whitespace, file name
static REDIRECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*>\s*(.+)$").expect("redirect pattern is valid"));

/// Drops one leading and one trailing quote character, independently.
fn strip_quotes(text: &str) -> &str {
    let is_quote = |c: char| c == '"' || c == '\'';
    let text = text.strip_prefix(is_quote).unwrap_or(text);
    text.strip_suffix(is_quote).unwrap_or(text)
}

pub struct PwdCommand;

impl Executable for PwdCommand {
    fn execute(&self, fs: &VirtualFilesystem, _args: Vec<&str>) -> CommandResult {
        CommandResult::new().with_output(fs.current_directory())
    }
}

pub struct EchoCommand;

impl Executable for EchoCommand {
    fn execute(&self, fs: &VirtualFilesystem, args: Vec<&str>) -> CommandResult {
        let line = args.join(" ");

        if let Some(caps) = REDIRECT.captures(&line) {
            let content = strip_quotes(&caps[1]);
            let file_name = caps[2].trim();
            log::debug!("echo redirect into {file_name}");
            return CommandResult::new().with_filesystem(fs.write_to_file(file_name, content));
        }

        CommandResult::new().with_output(strip_quotes(&line))
    }
}

pub struct ClearCommand;

impl Executable for ClearCommand {
    fn execute(&self, _fs: &VirtualFilesystem, _args: Vec<&str>) -> CommandResult {
        CommandResult::new()
    }
}
