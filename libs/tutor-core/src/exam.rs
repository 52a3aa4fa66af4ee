//! Timed exam state machine.
//!
//! `Setup -> Playing -> Finished`, with `reset` returning to `Setup`. The
//! machine is driven by discrete calls; the countdown advances only through
//! [`ExamMachine::tick`], which is ignored outside `Playing`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ExamError;
use crate::types::{ExamQuestion, Level, Section};

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamState {
    Setup,
    Playing,
    Finished,
}

/// Why an exam finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Timeout,
    Submitted,
}

/// Cursor movement between questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "direction", content = "index")]
pub enum Navigation {
    Next,
    Previous,
    To(usize),
}

/// A running or finished exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSession {
    pub id: Uuid,
    pub level: Level,
    pub questions: Vec<ExamQuestion>,
    /// One slot per question; `None` is unanswered.
    pub answers: Vec<Option<String>>,
    pub remaining_secs: u32,
    pub cursor: usize,
    pub started_at: DateTime<Utc>,
}

impl ExamSession {
    pub fn unanswered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_none()).count()
    }

    fn check_index(&self, index: usize) -> Result<(), ExamError> {
        if index < self.questions.len() {
            Ok(())
        } else {
            Err(ExamError::QuestionOutOfRange {
                index,
                len: self.questions.len(),
            })
        }
    }

    fn score(&self) -> usize {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| a.as_deref().is_some_and(|choice| q.is_correct(choice)))
            .count()
    }

    fn section_scores(&self) -> Vec<SectionScore> {
        let mut scores: Vec<SectionScore> = Vec::new();
        for (question, answer) in self.questions.iter().zip(&self.answers) {
            let idx = match scores.iter().position(|s| s.section == question.section) {
                Some(idx) => idx,
                None => {
                    scores.push(SectionScore {
                        section: question.section,
                        correct: 0,
                        total: 0,
                    });
                    scores.len() - 1
                }
            };
            let entry = &mut scores[idx];
            entry.total += 1;
            if answer.as_deref().is_some_and(|choice| question.is_correct(choice)) {
                entry.correct += 1;
            }
        }
        scores
    }
}

/// Per-section tally in a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScore {
    pub section: Section,
    pub correct: usize,
    pub total: usize,
}

/// Frozen summary recorded when an exam finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub session_id: Uuid,
    pub level: Level,
    pub score: usize,
    pub total: usize,
    pub answers: Vec<Option<String>>,
    pub section_scores: Vec<SectionScore>,
    pub reason: FinishReason,
    pub remaining_secs: u32,
    pub finished_at: DateTime<Utc>,
}

/// Outcome of a learner submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Unanswered questions remain and the learner has not confirmed.
    NeedsConfirmation { unanswered: usize },
    Finished { result: ExamResult },
}

/// Question as shown to the learner. The answer key is hidden while playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub section: Section,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_script: Option<String>,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Read-only view of the machine for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSnapshot {
    pub state: ExamState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    pub cursor: usize,
    pub remaining_secs: u32,
    pub questions: Vec<QuestionView>,
    pub answers: Vec<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExamResult>,
}

/// The exam state machine. One machine holds at most one session.
#[derive(Debug, Clone)]
pub struct ExamMachine {
    duration_secs: u32,
    state: ExamState,
    session: Option<ExamSession>,
    result: Option<ExamResult>,
}

impl ExamMachine {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            state: ExamState::Setup,
            session: None,
            result: None,
        }
    }

    pub fn state(&self) -> ExamState {
        self.state
    }

    pub fn session(&self) -> Option<&ExamSession> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Move from `Setup` to `Playing` with a fresh question set.
    pub fn begin(
        &mut self,
        level: Level,
        questions: Vec<ExamQuestion>,
        now: DateTime<Utc>,
    ) -> Result<Uuid, ExamError> {
        if self.state != ExamState::Setup {
            return Err(self.invalid("start"));
        }
        if questions.is_empty() {
            return Err(ExamError::EmptyQuestionSet);
        }

        let id = Uuid::new_v4();
        self.session = Some(ExamSession {
            id,
            level,
            answers: vec![None; questions.len()],
            questions,
            remaining_secs: self.duration_secs,
            cursor: 0,
            started_at: now,
        });
        self.result = None;
        self.state = ExamState::Playing;
        Ok(id)
    }

    /// Store `choice` for question `index`, replacing any earlier answer.
    pub fn answer(&mut self, index: usize, choice: &str) -> Result<(), ExamError> {
        let session = self.playing_session_mut("answer")?;
        session.check_index(index)?;
        if !session.questions[index].has_option(choice) {
            return Err(ExamError::OptionOutOfRange {
                index,
                choice: choice.to_string(),
            });
        }
        session.answers[index] = Some(choice.to_string());
        Ok(())
    }

    pub fn clear_answer(&mut self, index: usize) -> Result<(), ExamError> {
        let session = self.playing_session_mut("clear answer")?;
        session.check_index(index)?;
        session.answers[index] = None;
        Ok(())
    }

    /// Move the read cursor. Allowed while playing and when reviewing a
    /// finished exam; never affects scoring.
    pub fn navigate(&mut self, nav: Navigation) -> Result<usize, ExamError> {
        let state = self.state;
        let session = match (&mut self.session, state) {
            (Some(session), ExamState::Playing | ExamState::Finished) => session,
            _ => {
                return Err(ExamError::InvalidTransition {
                    state,
                    action: "navigate",
                })
            }
        };

        let last = session.questions.len().saturating_sub(1);
        session.cursor = match nav {
            Navigation::Next => (session.cursor + 1).min(last),
            Navigation::Previous => session.cursor.saturating_sub(1),
            Navigation::To(index) => {
                session.check_index(index)?;
                index
            }
        };
        Ok(session.cursor)
    }

    /// Apply one countdown tick. Returns the result when the tick ran the
    /// clock out. Ticks outside `Playing` are ignored.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<ExamResult> {
        if self.state != ExamState::Playing {
            return None;
        }
        let session = self.session.as_mut()?;
        session.remaining_secs = session.remaining_secs.saturating_sub(1);
        if session.remaining_secs == 0 {
            self.finish(FinishReason::Timeout, now).ok().cloned()
        } else {
            None
        }
    }

    /// Score and freeze the session. Calling again once finished returns the
    /// recorded result unchanged.
    pub fn finish(&mut self, reason: FinishReason, now: DateTime<Utc>) -> Result<&ExamResult, ExamError> {
        match self.state {
            ExamState::Setup => Err(self.invalid("finish")),
            ExamState::Finished => self.result.as_ref().ok_or(ExamError::InvalidTransition {
                state: ExamState::Finished,
                action: "finish",
            }),
            ExamState::Playing => {
                let session = self
                    .session
                    .as_ref()
                    .ok_or(ExamError::EmptyQuestionSet)?;
                let result = ExamResult {
                    session_id: session.id,
                    level: session.level,
                    score: session.score(),
                    total: session.questions.len(),
                    answers: session.answers.clone(),
                    section_scores: session.section_scores(),
                    reason,
                    remaining_secs: session.remaining_secs,
                    finished_at: now,
                };
                self.state = ExamState::Finished;
                Ok(&*self.result.insert(result))
            }
        }
    }

    /// Learner submission. Without `confirm`, a submission with unanswered
    /// questions is held back so the UI can ask first.
    pub fn submit(&mut self, confirm: bool, now: DateTime<Utc>) -> Result<SubmitOutcome, ExamError> {
        if self.state == ExamState::Playing && !confirm {
            let unanswered = self.session.as_ref().map_or(0, ExamSession::unanswered);
            if unanswered > 0 {
                return Ok(SubmitOutcome::NeedsConfirmation { unanswered });
            }
        }
        let result = self.finish(FinishReason::Submitted, now)?.clone();
        Ok(SubmitOutcome::Finished { result })
    }

    /// Clear the session and return to `Setup`. Not allowed mid-exam.
    pub fn reset(&mut self) -> Result<(), ExamError> {
        if self.state == ExamState::Playing {
            return Err(self.invalid("reset"));
        }
        self.session = None;
        self.result = None;
        self.state = ExamState::Setup;
        Ok(())
    }

    pub fn snapshot(&self) -> ExamSnapshot {
        let reveal = self.state == ExamState::Finished;
        match &self.session {
            Some(session) => ExamSnapshot {
                state: self.state,
                session_id: Some(session.id),
                level: Some(session.level),
                cursor: session.cursor,
                remaining_secs: session.remaining_secs,
                questions: session
                    .questions
                    .iter()
                    .map(|q| QuestionView {
                        section: q.section,
                        prompt: q.prompt.clone(),
                        audio_script: q.audio_script.clone(),
                        options: q.options.clone(),
                        correct_answer: reveal.then(|| q.correct_answer.clone()),
                        explanation: reveal.then(|| q.explanation.clone()),
                    })
                    .collect(),
                answers: session.answers.clone(),
                result: self.result.clone(),
            },
            None => ExamSnapshot {
                state: self.state,
                session_id: None,
                level: None,
                cursor: 0,
                remaining_secs: self.duration_secs,
                questions: Vec::new(),
                answers: Vec::new(),
                result: None,
            },
        }
    }

    fn playing_session_mut(&mut self, action: &'static str) -> Result<&mut ExamSession, ExamError> {
        let state = self.state;
        match (&mut self.session, state) {
            (Some(session), ExamState::Playing) => Ok(session),
            _ => Err(ExamError::InvalidTransition { state, action }),
        }
    }

    fn invalid(&self, action: &'static str) -> ExamError {
        ExamError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}
