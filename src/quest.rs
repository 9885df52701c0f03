pub mod engine;
pub mod missions;

pub use engine::{QuestEngine, QuestSubmission};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::terminal::VirtualFilesystem;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    #[error("unknown quest: {0}")]
    UnknownQuest(String),
    #[error("session not found: {0}")]
    SessionNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_advance: Option<bool>,
}

impl ValidationResult {
    pub fn new(is_valid: bool, message: impl Into<String>) -> Self {
        Self {
            is_valid,
            message: Some(message.into()),
            should_advance: Some(is_valid),
        }
    }

    /// A rejection that carries no advancement hint at all.
    pub fn inert(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: Some(message.into()),
            should_advance: None,
        }
    }

    pub fn with_should_advance(mut self, should_advance: bool) -> Self {
        self.should_advance = Some(should_advance);
        self
    }

    /// A missing `should_advance` counts as "stay on this step".
    pub fn advances(&self) -> bool {
        self.is_valid && self.should_advance.unwrap_or(false)
    }
}

/// Checks a raw input line against the filesystem as it stands after the
/// command ran.
pub type CustomValidator = Arc<dyn Fn(&str, &VirtualFilesystem) -> ValidationResult + Send + Sync>;

#[derive(Clone)]
pub enum StepValidator {
    ExactMatch(Vec<String>),
    Custom(CustomValidator),
}

impl fmt::Debug for StepValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepValidator::ExactMatch(commands) => {
                f.debug_tuple("ExactMatch").field(commands).finish()
            }
            StepValidator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Clone, Serialize)]
pub struct QuestStep {
    pub id: String,
    pub number: usize,
    pub title: String,
    pub description: String,
    pub expected_commands: Vec<String>,
    pub alternative_commands: Vec<String>,
    pub completed: bool,
    pub success_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip)]
    custom_validator: Option<CustomValidator>,
}

impl fmt::Debug for QuestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestStep")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("completed", &self.completed)
            .field("validator", &self.validator())
            .finish()
    }
}

impl QuestStep {
    pub fn new(number: usize, title: &str, description: &str) -> Self {
        Self {
            id: format!("step-{number}"),
            number,
            title: title.to_string(),
            description: description.to_string(),
            expected_commands: Vec::new(),
            alternative_commands: Vec::new(),
            completed: false,
            success_message: String::new(),
            error_message: None,
            custom_validator: None,
        }
    }

    pub fn with_expected<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_alternatives<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternative_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_success_message(mut self, message: &str) -> Self {
        self.success_message = message.to_string();
        self
    }

    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &VirtualFilesystem) -> ValidationResult + Send + Sync + 'static,
    {
        self.custom_validator = Some(Arc::new(validator));
        self
    }

    /// The custom validator when one is set, otherwise exact matching against
    /// the expected and alternative commands.
    pub fn validator(&self) -> StepValidator {
        match &self.custom_validator {
            Some(custom) => StepValidator::Custom(Arc::clone(custom)),
            None => StepValidator::ExactMatch(
                self.expected_commands
                    .iter()
                    .chain(&self.alternative_commands)
                    .cloned()
                    .collect(),
            ),
        }
    }

    pub fn validate(&self, input: &str, fs: &VirtualFilesystem) -> ValidationResult {
        match self.validator() {
            StepValidator::Custom(custom) => custom(input, fs),
            StepValidator::ExactMatch(commands) => {
                let input = input.trim().to_lowercase();
                let is_valid = commands.iter().any(|cmd| cmd.to_lowercase() == input);
                let message = if is_valid {
                    Some(self.success_message.clone())
                } else {
                    self.error_message.clone()
                };
                ValidationResult {
                    is_valid,
                    message,
                    should_advance: Some(is_valid),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (100.0 * completed as f64 / total as f64).round() as u32
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestState {
    NotStarted,
    InProgress,
    Completed,
}

/// An ordered list of steps plus the cursor walking them.
#[derive(Debug, Clone, Serialize)]
pub struct TerminalQuest {
    pub id: String,
    pub title: String,
    pub description: String,
    steps: Vec<QuestStep>,
    current_step_index: usize,
    completed: bool,
    #[serde(skip)]
    initial_filesystem: VirtualFilesystem,
    pub welcome_message: String,
    pub completion_message: String,
}

impl TerminalQuest {
    pub fn new(id: &str, title: &str, description: &str, initial_filesystem: VirtualFilesystem) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            steps: Vec::new(),
            current_step_index: 0,
            completed: false,
            initial_filesystem,
            welcome_message: String::new(),
            completion_message: String::new(),
        }
    }

    pub fn with_welcome_message(mut self, message: &str) -> Self {
        self.welcome_message = message.to_string();
        self
    }

    pub fn with_completion_message(mut self, message: &str) -> Self {
        self.completion_message = message.to_string();
        self
    }

    pub fn with_step(mut self, step: QuestStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[QuestStep] {
        &self.steps
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn current_step(&self) -> Option<&QuestStep> {
        self.steps.get(self.current_step_index)
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn initial_filesystem(&self) -> &VirtualFilesystem {
        &self.initial_filesystem
    }

    /// Marks the step under the cursor done and moves on. Returns true when
    /// that was the last step.
    pub fn complete_current_step(&mut self) -> bool {
        let Some(step) = self.steps.get_mut(self.current_step_index) else {
            return false;
        };
        step.completed = true;
        self.current_step_index += 1;
        if self.current_step_index >= self.steps.len() {
            self.completed = true;
        }
        self.completed
    }

    pub fn reset(&mut self) {
        self.current_step_index = 0;
        self.completed = false;
        for step in &mut self.steps {
            step.completed = false;
        }
    }

    pub fn progress(&self) -> Progress {
        let completed = self.steps.iter().filter(|step| step.completed).count();
        Progress::new(completed, self.steps.len())
    }
}
