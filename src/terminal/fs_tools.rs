use super::command::{CommandResult, Executable};
use super::vfs::{VfsError, VirtualFilesystem, DIR_PERMISSIONS, FILE_PERMISSIONS};
use super::{HOME_DIR, USER};

// `ls -l` shows placeholder sizes and a fixed date rather than real metadata.
const DIR_DISPLAY_SIZE: &str = "4096";
const FILE_DISPLAY_SIZE: &str = "1024";
const LISTING_DATE: &str = "Nov 15 10:30";

/// Splits arguments into option characters and positional targets.
pub fn parse_options(args: Vec<&str>) -> (Vec<char>, Vec<&str>) {
    args.into_iter().fold(
        (Vec::<char>::new(), Vec::<&str>::new()),
        |(mut options, mut targets), s| {
            if s.starts_with('-') {
                options.extend(s.chars().filter(|c| *c != '-'));
            } else {
                targets.push(s);
            }
            (options, targets)
        },
    )
}

pub struct LsCommand;

impl LsCommand {
    fn long_line(item: &str) -> String {
        let (permissions, size) = if item.ends_with('/') {
            (DIR_PERMISSIONS, DIR_DISPLAY_SIZE)
        } else {
            (FILE_PERMISSIONS, FILE_DISPLAY_SIZE)
        };
        format!("{permissions} 1 {USER} {USER} {size:>8} {LISTING_DATE} {item}")
    }
}

impl Executable for LsCommand {
    fn execute(&self, fs: &VirtualFilesystem, args: Vec<&str>) -> CommandResult {
        // unrecognised flags are ignored
        let (options, targets) = parse_options(args);
        let show_hidden = options.contains(&'a');
        let long_format = options.contains(&'l');

        let target = targets
            .first()
            .copied()
            .unwrap_or(fs.current_directory());
        if fs.file_at(target).is_some() {
            let output = if long_format {
                Self::long_line(target)
            } else {
                target.to_string()
            };
            return CommandResult::new().with_output(output);
        }
        if !fs.path_exists(target) {
            return CommandResult::new()
                .with_output(format!(
                    "ls: cannot access '{target}': No such file or directory"
                ))
                .with_error("Directory not found");
        }

        let items = fs.list_directory(Some(target), show_hidden);
        let output = if long_format {
            items
                .iter()
                .map(|item| Self::long_line(item))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            items.join("  ")
        };

        CommandResult::new().with_output(output)
    }
}

pub struct CdCommand;

impl Executable for CdCommand {
    fn execute(&self, fs: &VirtualFilesystem, args: Vec<&str>) -> CommandResult {
        let target = args.first().copied().unwrap_or(HOME_DIR);
        if !fs.path_exists(target) {
            return CommandResult::new()
                .with_output(format!("cd: {target}: No such file or directory"))
                .with_error("Directory not found");
        }
        CommandResult::new().with_filesystem(fs.change_directory(target))
    }
}

pub struct CatCommand;

impl Executable for CatCommand {
    fn execute(&self, fs: &VirtualFilesystem, args: Vec<&str>) -> CommandResult {
        let Some(name) = args.first() else {
            return CommandResult::new()
                .with_output("cat: missing file operand")
                .with_error("Missing filename");
        };

        match fs.file_content(name, None) {
            Some(content) => CommandResult::new().with_output(content),
            None => CommandResult::new()
                .with_output(format!("cat: {name}: No such file or directory"))
                .with_error("File not found"),
        }
    }
}

pub struct MkdirCommand;

impl Executable for MkdirCommand {
    fn execute(&self, fs: &VirtualFilesystem, args: Vec<&str>) -> CommandResult {
        let Some(name) = args.first() else {
            return CommandResult::new()
                .with_output("mkdir: missing operand")
                .with_error("Missing directory name");
        };

        match fs.try_make_directory(name) {
            Ok(next) => CommandResult::new().with_filesystem(next),
            Err(VfsError::AlreadyExists) => CommandResult::new()
                .with_output(format!("mkdir: cannot create directory '{name}': File exists"))
                .with_error("Directory already exists"),
            Err(e) => CommandResult::new()
                .with_output(format!("mkdir: cannot create directory '{name}': {e}"))
                .with_error("Parent directory not found"),
        }
    }
}

pub struct TouchCommand;

impl Executable for TouchCommand {
    fn execute(&self, fs: &VirtualFilesystem, args: Vec<&str>) -> CommandResult {
        let Some(name) = args.first() else {
            return CommandResult::new()
                .with_output("touch: missing file operand")
                .with_error("Missing filename");
        };
        CommandResult::new().with_filesystem(fs.touch_file(name))
    }
}

pub struct RmCommand;

impl Executable for RmCommand {
    fn execute(&self, fs: &VirtualFilesystem, args: Vec<&str>) -> CommandResult {
        let Some(name) = args.first() else {
            return CommandResult::new()
                .with_output("rm: missing operand")
                .with_error("Missing filename");
        };

        if !fs.file_exists(name, None) {
            return CommandResult::new()
                .with_output(format!(
                    "rm: cannot remove '{name}': No such file or directory"
                ))
                .with_error("File not found");
        }
        CommandResult::new().with_filesystem(fs.remove_file(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> VirtualFilesystem {
        VirtualFilesystem::seed()
    }

    #[test]
    fn test_parse_options() {
        let (options, targets) = parse_options(vec!["-la", "docs", "-a"]);
        assert_eq!(options, vec!['l', 'a', 'a']);
        assert_eq!(targets, vec!["docs"]);
    }

    #[test]
    fn test_ls_plain_and_hidden() {
        let fs = seed().make_directory("hackzone");

        let plain = LsCommand.execute(&fs, vec![]);
        assert!(plain.success());
        assert_eq!(plain.output(), "hackzone/  readme.txt");

        let all = LsCommand.execute(&fs, vec!["-a"]);
        assert_eq!(all.output(), ".secret.txt  hackzone/  readme.txt");
    }

    #[test]
    fn test_ls_long_format() {
        let fs = seed().make_directory("hackzone");
        let res = LsCommand.execute(&fs, vec!["-al"]);
        let lines: Vec<&str> = res.output().lines().collect();

        assert_eq!(
            lines,
            vec![
                "-rw-r--r-- 1 user user     1024 Nov 15 10:30 .secret.txt",
                "drwxr-xr-x 1 user user     4096 Nov 15 10:30 hackzone/",
                "-rw-r--r-- 1 user user     1024 Nov 15 10:30 readme.txt",
            ]
        );

        let split_flags = LsCommand.execute(&fs, vec!["-l", "-a"]);
        assert_eq!(split_flags.output(), res.output());

        let long_only = LsCommand.execute(&fs, vec!["-l"]);
        assert_eq!(long_only.output().lines().count(), 2);
    }

    #[test]
    fn test_ls_target_paths() {
        let fs = seed();
        assert_eq!(LsCommand.execute(&fs, vec!["/"]).output(), "home/");
        assert_eq!(LsCommand.execute(&fs, vec![".."]).output(), "user/");

        let empty = fs.make_directory("empty");
        let res = LsCommand.execute(&empty, vec!["empty"]);
        assert!(res.success());
        assert_eq!(res.output(), "");
    }

    #[test]
    fn test_ls_missing_target() {
        let fs = seed();

        let missing = LsCommand.execute(&fs, vec!["ghost"]);
        assert!(!missing.success());
        assert_eq!(
            missing.output(),
            "ls: cannot access 'ghost': No such file or directory"
        );
        assert!(!missing.filesystem_changed());
    }

    #[test]
    fn test_ls_ignores_unknown_flags() {
        let fs = seed();

        let human = LsCommand.execute(&fs, vec!["-h"]);
        assert!(human.success());
        assert_eq!(human.output(), "readme.txt");

        let one_per_line = LsCommand.execute(&fs, vec!["-1a"]);
        assert!(one_per_line.success());
        assert_eq!(one_per_line.output(), ".secret.txt  readme.txt");
    }

    #[test]
    fn test_ls_file_target() {
        let fs = seed();

        let plain = LsCommand.execute(&fs, vec!["readme.txt"]);
        assert!(plain.success());
        assert_eq!(plain.output(), "readme.txt");

        let long = LsCommand.execute(&fs, vec!["-l", "readme.txt"]);
        assert_eq!(
            long.output(),
            "-rw-r--r-- 1 user user     1024 Nov 15 10:30 readme.txt"
        );

        let hidden = LsCommand.execute(&fs, vec![".secret.txt"]);
        assert_eq!(hidden.output(), ".secret.txt");

        let from_root = LsCommand.execute(&fs.change_directory("/"), vec!["home/user/readme.txt"]);
        assert!(from_root.success());
        assert_eq!(from_root.output(), "home/user/readme.txt");
    }

    #[test]
    fn test_cd() {
        let fs = seed();

        let up = CdCommand.execute(&fs, vec![".."]);
        assert!(up.success());
        assert!(up.filesystem_changed());
        assert_eq!(up.output(), "");
        assert_eq!(up.new_filesystem().unwrap().current_directory(), "/home");

        let root = fs.change_directory("/");
        let home = CdCommand.execute(&root, vec![]);
        assert_eq!(
            home.new_filesystem().unwrap().current_directory(),
            "/home/user"
        );

        let here = CdCommand.execute(&fs, vec!["."]);
        assert!(here.success());
    }

    #[test]
    fn test_cd_nonexistent() {
        let fs = seed();
        let res = CdCommand.execute(&fs, vec!["nonexistent"]);

        assert!(!res.success());
        assert!(!res.filesystem_changed());
        assert!(res.new_filesystem().is_none());
        assert_eq!(res.output(), "cd: nonexistent: No such file or directory");
        assert_eq!(fs.current_directory(), "/home/user");

        let into_file = CdCommand.execute(&fs, vec!["readme.txt"]);
        assert!(!into_file.success());
    }

    #[test]
    fn test_cat() {
        let fs = seed();

        let res = CatCommand.execute(&fs, vec!["readme.txt"]);
        assert!(res.success());
        assert_eq!(
            res.output(),
            "Welcome to the system. Use standard Unix commands to navigate."
        );

        let none = CatCommand.execute(&fs, vec![]);
        assert!(!none.success());
        assert_eq!(none.output(), "cat: missing file operand");

        let missing = CatCommand.execute(&fs, vec!["ghost.txt"]);
        assert!(!missing.success());
        assert_eq!(missing.output(), "cat: ghost.txt: No such file or directory");

        let dir = CatCommand.execute(&fs.change_directory(".."), vec!["user"]);
        assert!(!dir.success());
    }

    #[test]
    fn test_mkdir() {
        let fs = seed();

        let res = MkdirCommand.execute(&fs, vec!["hackzone"]);
        assert!(res.success());
        assert!(res.filesystem_changed());
        let next = res.new_filesystem().unwrap();
        assert!(next.path_exists("/home/user/hackzone"));

        let again = MkdirCommand.execute(next, vec!["hackzone"]);
        assert!(!again.success());
        assert!(!again.filesystem_changed());
        assert_eq!(
            again.output(),
            "mkdir: cannot create directory 'hackzone': File exists"
        );
    }

    #[test]
    fn test_mkdir_errors() {
        let fs = seed();

        let none = MkdirCommand.execute(&fs, vec![]);
        assert_eq!(none.output(), "mkdir: missing operand");
        assert!(!none.success());

        let orphan = MkdirCommand.execute(&fs, vec!["a/b"]);
        assert!(!orphan.success());
        assert_eq!(
            orphan.output(),
            "mkdir: cannot create directory 'a/b': No such file or directory"
        );

        let over_file = MkdirCommand.execute(&fs, vec!["readme.txt"]);
        assert!(over_file.output().ends_with("File exists"));
    }

    #[test]
    fn test_touch() {
        let fs = seed();

        let res = TouchCommand.execute(&fs, vec!["exploit.sh"]);
        assert!(res.success());
        let next = res.new_filesystem().unwrap();
        assert_eq!(next.file_content("exploit.sh", None), Some(""));

        let none = TouchCommand.execute(&fs, vec![]);
        assert!(!none.success());
        assert_eq!(none.output(), "touch: missing file operand");
    }

    #[test]
    fn test_rm() {
        let fs = seed();

        let res = RmCommand.execute(&fs, vec!["readme.txt"]);
        assert!(res.success());
        let next = res.new_filesystem().unwrap();
        assert!(!next.file_exists("readme.txt", None));

        let cat = CatCommand.execute(next, vec!["readme.txt"]);
        assert!(!cat.success());
        assert!(cat.output().contains("No such file or directory"));

        let again = RmCommand.execute(next, vec!["readme.txt"]);
        assert!(!again.success());
        assert_eq!(
            again.output(),
            "rm: cannot remove 'readme.txt': No such file or directory"
        );

        let none = RmCommand.execute(&fs, vec![]);
        assert_eq!(none.output(), "rm: missing operand");
    }
}
