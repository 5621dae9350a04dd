//! Sessions: named snapshots of a project's working context.

pub mod domain;
pub mod repository;
pub mod resume;
pub mod service;

pub use domain::{CursorPosition, FileState, GitSnapshot, Session};
pub use repository::SessionRepository;
pub use resume::{
    DirtyChoice, ResumeOptions, ResumeOutcome, ResumeReport, ResumeService, ResumeStep,
    StepOutcome, StepRecord,
};
pub use service::{SaveSessionRequest, SessionService, SessionUpdate};
