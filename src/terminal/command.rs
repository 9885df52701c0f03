use serde::Serialize;

use super::vfs::VirtualFilesystem;

pub trait Executable: Send + Sync {
    fn execute(&self, fs: &VirtualFilesystem, args: Vec<&str>) -> CommandResult;
}

/// Outcome of one command line. A new snapshot is attached exactly when the
/// command changed the filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    output: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    filesystem_changed: bool,
    #[serde(skip)]
    new_filesystem: Option<VirtualFilesystem>,
}

impl Default for CommandResult {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandResult {
    /// Create a new empty successful result
    pub fn new() -> Self {
        Self {
            output: String::new(),
            success: true,
            error: None,
            filesystem_changed: false,
            new_filesystem: None,
        }
    }

    pub fn with_output(mut self, text: impl Into<String>) -> Self {
        self.output = text.into();
        self
    }

    /// Mark this result as failed with a short description of why
    pub fn with_error(mut self, description: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(description.into());
        self
    }

    pub fn with_filesystem(mut self, fs: VirtualFilesystem) -> Self {
        self.filesystem_changed = true;
        self.new_filesystem = Some(fs);
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filesystem_changed(&self) -> bool {
        self.filesystem_changed
    }

    pub fn new_filesystem(&self) -> Option<&VirtualFilesystem> {
        self.new_filesystem.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmd {
    Ls,
    Pwd,
    Cd,
    Cat,
    MkDir,
    Touch,
    Echo,
    Rm,
    Ssh,
    Clear,
    Unknown,
}

impl From<&str> for Cmd {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "ls" => Self::Ls,
            "pwd" => Self::Pwd,
            "cd" => Self::Cd,
            "cat" => Self::Cat,
            "mkdir" => Self::MkDir,
            "touch" => Self::Touch,
            "echo" => Self::Echo,
            "rm" => Self::Rm,
            "ssh" => Self::Ssh,
            "clear" => Self::Clear,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_from_str_ignores_case() {
        assert_eq!(Cmd::from("ls"), Cmd::Ls);
        assert_eq!(Cmd::from("LS"), Cmd::Ls);
        assert_eq!(Cmd::from("MkDir"), Cmd::MkDir);
        assert_eq!(Cmd::from("sudo"), Cmd::Unknown);
        assert_eq!(Cmd::from(""), Cmd::Unknown);
    }

    #[test]
    fn test_filesystem_attached_only_when_changed() {
        let plain = CommandResult::new().with_output("hi");
        assert!(plain.success());
        assert!(!plain.filesystem_changed());
        assert!(plain.new_filesystem().is_none());

        let changed = CommandResult::new().with_filesystem(VirtualFilesystem::seed());
        assert!(changed.filesystem_changed());
        assert!(changed.new_filesystem().is_some());

        let failed = CommandResult::new()
            .with_output("cat: missing file operand")
            .with_error("Missing filename");
        assert!(!failed.success());
        assert_eq!(failed.error(), Some("Missing filename"));
    }
}
