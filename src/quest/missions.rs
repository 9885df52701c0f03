use super::{QuestError, QuestStep, TerminalQuest, ValidationResult};
use crate::terminal::VirtualFilesystem;

pub const FIRST_MISSION_ID: &str = "first-mission";

/// Ids of every mission `find` knows about.
pub const MISSIONS: &[&str] = &[FIRST_MISSION_ID];

/// Looks a mission up by id; `None` picks the first mission.
pub fn find(quest_id: Option<&str>) -> Result<TerminalQuest, QuestError> {
    match quest_id.unwrap_or(FIRST_MISSION_ID) {
        FIRST_MISSION_ID => Ok(first_mission()),
        other => Err(QuestError::UnknownQuest(other.to_string())),
    }
}

// Accepts the line only when it is exactly one of `commands` after trimming.
fn exact_line(
    commands: &'static [&'static str],
    success: &'static str,
    hint: &'static str,
) -> impl Fn(&str, &VirtualFilesystem) -> ValidationResult + Send + Sync + 'static {
    move |input: &str, _fs: &VirtualFilesystem| {
        let input = input.trim();
        let is_valid = commands.iter().any(|cmd| *cmd == input);
        ValidationResult::new(is_valid, if is_valid { success } else { hint })
    }
}

pub fn first_mission() -> TerminalQuest {
    TerminalQuest::new(
        FIRST_MISSION_ID,
        "System Infiltration - First Mission",
        "Infiltrate the target system and complete reconnaissance tasks using Linux commands.",
        VirtualFilesystem::seed(),
    )
    .with_welcome_message(
        "Mission briefing: You have successfully infiltrated the target system. Use Linux commands to navigate and complete your objectives.",
    )
    .with_completion_message(
        "Excellent work, agent! Mission completed successfully. All objectives achieved.",
    )
    .with_step(
        QuestStep::new(1, "Establish Connection", "Connect to the system using SSH simulation")
            .with_expected(["ssh", "ssh user@target"])
            .with_alternatives(["ssh target", "ssh user@hackbox"])
            .with_success_message("Connection established successfully!")
            .with_error_message("Use the ssh command to establish connection"),
    )
    .with_step(
        QuestStep::new(2, "List Directory Contents", "List files in the current directory")
            .with_expected(["ls"])
            .with_success_message("Directory contents listed!")
            .with_error_message("Use the ls command to list files"),
    )
    .with_step(
        QuestStep::new(3, "Find Hidden Files", "Display all files including hidden ones")
            .with_expected(["ls -a"])
            .with_alternatives(["ls -la", "ls -al"])
            .with_success_message("Hidden files revealed!")
            .with_error_message("Use ls -a to show hidden files (files starting with .)"),
    )
    .with_step(
        QuestStep::new(4, "Read Secret File", "Display the contents of the hidden secret file")
            .with_expected(["cat .secret.txt"])
            .with_success_message("Secret intelligence gathered!")
            .with_error_message("Use cat to read the .secret.txt file")
            .with_validator(exact_line(
                &["cat .secret.txt"],
                "Mission briefing retrieved!",
                "Read the .secret.txt file using cat",
            )),
    )
    .with_step(
        QuestStep::new(5, "Check Current Location", "Print the current working directory path")
            .with_expected(["pwd"])
            .with_success_message("Current location confirmed!")
            .with_error_message("Use pwd to print the working directory"),
    )
    .with_step(
        QuestStep::new(6, "Create Operations Folder", "Create a new directory called \"hackzone\"")
            .with_expected(["mkdir hackzone"])
            .with_success_message("Operations folder created!")
            .with_error_message("Use mkdir to create the hackzone directory")
            .with_validator(exact_line(
                &["mkdir hackzone"],
                "Hackzone directory created!",
                "Create a directory named \"hackzone\" using mkdir",
            )),
    )
    .with_step(
        QuestStep::new(7, "Enter Operations Folder", "Change directory to the hackzone folder")
            .with_expected(["cd hackzone"])
            .with_success_message("Entered operations folder!")
            .with_error_message("Use cd to change to the hackzone directory")
            .with_validator(|input, fs| {
                let typed = input.trim() == "cd hackzone";
                let in_hackzone = fs.current_directory().ends_with("/hackzone");
                let message = if in_hackzone {
                    "Now in hackzone directory!"
                } else {
                    "Change to the hackzone directory using cd"
                };
                ValidationResult::new(typed && in_hackzone, message).with_should_advance(typed)
            }),
    )
    .with_step(
        QuestStep::new(8, "Create Exploit Script", "Create an empty file called \"exploit.sh\"")
            .with_expected(["touch exploit.sh"])
            .with_success_message("Exploit script file created!")
            .with_error_message("Use touch to create the exploit.sh file"),
    )
    .with_step(
        QuestStep::new(9, "Write Script Content", "Write \"run\" into the exploit.sh file")
            .with_expected(["echo \"run\" > exploit.sh", "echo 'run' > exploit.sh"])
            .with_alternatives(["echo run > exploit.sh"])
            .with_success_message("Script content written!")
            .with_error_message("Use echo with redirection to write \"run\" to exploit.sh")
            .with_validator(exact_line(
                &[
                    "echo \"run\" > exploit.sh",
                    "echo 'run' > exploit.sh",
                    "echo run > exploit.sh",
                ],
                "Script payload written!",
                "Write \"run\" to exploit.sh using echo and redirection (>)",
            )),
    )
    .with_step(
        QuestStep::new(10, "Verify Script Content", "Display the contents of exploit.sh to verify")
            .with_expected(["cat exploit.sh"])
            .with_success_message("Script verified successfully!")
            .with_error_message("Use cat to display the contents of exploit.sh"),
    )
    .with_step(
        QuestStep::new(11, "Clean Up Evidence", "Delete the exploit.sh file to cover tracks")
            .with_expected(["rm exploit.sh"])
            .with_success_message("Evidence cleaned up successfully!")
            .with_error_message("Use rm to delete the exploit.sh file")
            .with_validator(exact_line(
                &["rm exploit.sh"],
                "All traces removed!",
                "Remove exploit.sh using rm command",
            )),
    )
}
