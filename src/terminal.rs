mod command;
mod fs_tools;
pub mod session;
mod simple_tools;
mod system_tools;
pub mod vfs;

pub use command::{Cmd, CommandResult, Executable};
pub use session::{prompt_for, OutputKind, OutputLine, TerminalSession};
pub use vfs::{normalize_path, VfsError, VirtualDirectory, VirtualFile, VirtualFilesystem};

use std::collections::HashMap;

use fs_tools::{CatCommand, CdCommand, LsCommand, MkdirCommand, RmCommand, TouchCommand};
use simple_tools::{ClearCommand, EchoCommand, PwdCommand};
use system_tools::{SshCommand, UnknownCommand};

pub const USER: &str = "user";
pub const HOSTNAME: &str = "hackbox";
pub const HOME_DIR: &str = "/home/user";

/// Command registry and dispatcher. Holds no state between lines, so one
/// shell can serve any number of sessions.
pub struct Shell {
    commands: HashMap<Cmd, Box<dyn Executable>>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        let mut shell = Self {
            commands: HashMap::new(),
        };
        shell.initialize_commands();
        shell
    }

    fn initialize_commands(&mut self) {
        // Filesystem commands
        self.commands.insert(Cmd::Ls, Box::new(LsCommand));
        self.commands.insert(Cmd::Cd, Box::new(CdCommand));
        self.commands.insert(Cmd::Cat, Box::new(CatCommand));
        self.commands.insert(Cmd::MkDir, Box::new(MkdirCommand));
        self.commands.insert(Cmd::Touch, Box::new(TouchCommand));
        self.commands.insert(Cmd::Rm, Box::new(RmCommand));

        self.commands.insert(Cmd::Pwd, Box::new(PwdCommand));
        self.commands.insert(Cmd::Echo, Box::new(EchoCommand));
        self.commands.insert(Cmd::Clear, Box::new(ClearCommand));
        self.commands.insert(Cmd::Ssh, Box::new(SshCommand));
    }

    /// Runs one input line against `fs`. The snapshot is never touched; a
    /// changed filesystem comes back inside the result.
    pub fn execute(&self, input: &str, fs: &VirtualFilesystem) -> CommandResult {
        let mut parts = input.split_whitespace();
        let Some(name) = parts.next() else {
            return CommandResult::new();
        };
        let args: Vec<&str> = parts.collect();
        let cmd = Cmd::from(name);
        log::debug!("dispatching {cmd:?} with {} argument(s)", args.len());

        match self.commands.get(&cmd) {
            Some(command) => command.execute(fs, args),
            None => UnknownCommand::new(name).execute(fs, args),
        }
    }
}
