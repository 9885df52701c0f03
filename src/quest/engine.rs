use serde::Serialize;

use super::{missions, Progress, QuestError, QuestState, QuestStep, TerminalQuest, ValidationResult};
use crate::terminal::{CommandResult, OutputKind, TerminalSession, VirtualFilesystem};

const NO_ACTIVE_QUEST: &str = "No active quest";
const NO_ACTIVE_STEP: &str = "No active step";
const NO_ACTIVE_SESSION: &str = "No active quest session";

/// What one submitted line did to the shell and to the quest.
#[derive(Debug, Clone, Serialize)]
pub struct QuestSubmission {
    pub command_result: CommandResult,
    pub validation: ValidationResult,
    pub step_completed: bool,
    pub quest_completed: bool,
}

/// Drives one quest run: the quest cursor plus the terminal session it
/// validates against.
#[derive(Debug, Clone, Default)]
pub struct QuestEngine {
    quest: Option<TerminalQuest>,
    session: Option<TerminalSession>,
}

/// A session on the quest's seed tree, greeted with its briefing.
fn open_session(quest: &TerminalQuest) -> TerminalSession {
    let mut session = TerminalSession::new(quest.initial_filesystem().clone());
    if !quest.welcome_message.is_empty() {
        session.add_output_line(quest.welcome_message.as_str(), OutputKind::Success);
    }
    session
}

fn validate_step(quest: &TerminalQuest, fs: &VirtualFilesystem, input: &str) -> ValidationResult {
    match quest.current_step() {
        Some(step) if !step.completed => step.validate(input, fs),
        _ => ValidationResult::inert(NO_ACTIVE_STEP),
    }
}

impl QuestEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh engine already running `quest_id` (the first mission when `None`).
    pub fn start(quest_id: Option<&str>) -> Result<Self, QuestError> {
        let mut engine = Self::new();
        engine.start_quest(quest_id)?;
        Ok(engine)
    }

    pub fn start_quest(&mut self, quest_id: Option<&str>) -> Result<(), QuestError> {
        let quest = missions::find(quest_id)?;
        self.load_quest(quest);
        Ok(())
    }

    /// Starts `quest` from its seed tree, replacing whatever ran before.
    pub fn load_quest(&mut self, quest: TerminalQuest) {
        log::info!("starting quest {} ({} steps)", quest.id, quest.steps().len());
        self.session = Some(open_session(&quest));
        self.quest = Some(quest);
    }

    pub fn state(&self) -> QuestState {
        match &self.quest {
            None => QuestState::NotStarted,
            Some(quest) if quest.is_completed() => QuestState::Completed,
            Some(_) => QuestState::InProgress,
        }
    }

    /// Checks `input` against the current step without running it.
    pub fn validate_current_step(&self, input: &str) -> ValidationResult {
        match (&self.quest, &self.session) {
            (Some(quest), Some(session)) => validate_step(quest, session.filesystem(), input),
            _ => ValidationResult::inert(NO_ACTIVE_QUEST),
        }
    }

    /// Runs `input` in the session, then validates it against the step under
    /// the cursor using the filesystem the command left behind. Advances at
    /// most one step.
    pub fn submit_command(&mut self, input: &str) -> QuestSubmission {
        let (Some(quest), Some(session)) = (self.quest.as_mut(), self.session.as_mut()) else {
            return QuestSubmission {
                command_result: CommandResult::new()
                    .with_output(NO_ACTIVE_SESSION)
                    .with_error(NO_ACTIVE_QUEST),
                validation: ValidationResult::inert(NO_ACTIVE_QUEST),
                step_completed: false,
                quest_completed: false,
            };
        };

        let command_result = session.process(input);
        let validation = validate_step(quest, session.filesystem(), input);

        let mut step_completed = false;
        let mut quest_completed = false;
        if validation.advances() {
            if let Some(step) = quest.current_step().filter(|step| !step.completed) {
                let message = validation
                    .message
                    .clone()
                    .unwrap_or_else(|| step.success_message.clone());
                log::info!("quest {}: {} completed", quest.id, step.id);

                quest_completed = quest.complete_current_step();
                step_completed = true;
                session.add_output_line(message, OutputKind::Success);
                if quest_completed {
                    log::info!("quest {} completed", quest.id);
                    session.add_output_line(quest.completion_message.as_str(), OutputKind::Success);
                }
            }
        } else {
            log::debug!("quest {}: '{}' did not advance", quest.id, input.trim());
        }

        QuestSubmission {
            command_result,
            validation,
            step_completed,
            quest_completed,
        }
    }

    /// Rewinds the cursor and starts a new session on the quest's seed tree.
    pub fn reset_quest(&mut self) {
        if let Some(quest) = self.quest.as_mut() {
            log::info!("resetting quest {}", quest.id);
            quest.reset();
            self.session = Some(open_session(quest));
        }
    }

    pub fn current_step(&self) -> Option<&QuestStep> {
        self.quest.as_ref()?.current_step()
    }

    pub fn progress(&self) -> Progress {
        self.quest
            .as_ref()
            .map_or(Progress::new(0, 0), TerminalQuest::progress)
    }

    pub fn is_quest_active(&self) -> bool {
        self.quest.is_some()
    }

    pub fn is_quest_completed(&self) -> bool {
        self.quest.as_ref().is_some_and(TerminalQuest::is_completed)
    }

    pub fn current_quest_title(&self) -> &str {
        self.quest.as_ref().map_or("", |quest| quest.title.as_str())
    }

    pub fn current_step_title(&self) -> &str {
        self.current_step().map_or("", |step| step.title.as_str())
    }

    pub fn current_step_description(&self) -> &str {
        self.current_step().map_or("", |step| step.description.as_str())
    }

    pub fn quest(&self) -> Option<&TerminalQuest> {
        self.quest.as_ref()
    }

    pub fn session(&self) -> Option<&TerminalSession> {
        self.session.as_ref()
    }
}
