use super::command::{CommandResult, Executable};
use super::vfs::VirtualFilesystem;

const SSH_BANNER: &str = "Connection to remote system established.
Authentication successful.
Welcome to the target server.";

/// Scripted login. No networking happens; arguments are accepted and ignored.
pub struct SshCommand;

impl Executable for SshCommand {
    fn execute(&self, _fs: &VirtualFilesystem, _args: Vec<&str>) -> CommandResult {
        CommandResult::new().with_output(SSH_BANNER)
    }
}

pub struct UnknownCommand {
    command: String,
}

impl UnknownCommand {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

impl Executable for UnknownCommand {
    fn execute(&self, _fs: &VirtualFilesystem, _args: Vec<&str>) -> CommandResult {
        CommandResult::new()
            .with_output(format!("{}: command not found", self.command))
            .with_error("Unknown command")
    }
}
