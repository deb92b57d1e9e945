use crate::candidates::CandidateSource;
use crate::config::ForceComplete;
use crate::error::TandemError;
use crate::session::{Category, InputSession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Exit(String),
    Continue,
}

pub fn choose_and_exit(session: &mut InputSession, candidate: &str) -> CommitOutcome {
    session.replace_field(candidate);
    CommitOutcome::Exit(session.text().to_string())
}

pub fn choose_dwim(
    session: &mut InputSession,
    candidate: &str,
    policy: ForceComplete,
    source: &dyn CandidateSource,
) -> Result<CommitOutcome, TandemError> {
    if !session.is_multiple() {
        return Ok(choose_and_exit(session, candidate));
    }
    let force = session.category() != Category::File;
    // Edits land on a copy so a failing source leaves the input untouched.
    let mut draft = session.clone();
    draft.replace_field(candidate);
    if force && policy == ForceComplete::BeforeAppend {
        force_complete(&mut draft, source)?;
    }
    draft.append_separator();
    if force && policy == ForceComplete::AfterAppend {
        force_complete(&mut draft, source)?;
    }
    *session = draft;
    Ok(CommitOutcome::Continue)
}

pub fn force_complete(
    session: &mut InputSession,
    source: &dyn CandidateSource,
) -> Result<bool, TandemError> {
    let listing = source.complete(session.field(), session)?;
    let Some(top) = listing
        .candidates
        .into_iter()
        .find(|candidate| !candidate.text.trim().is_empty())
    else {
        return Ok(false);
    };
    session.replace_field(&top.text);
    Ok(true)
}

pub fn edit_candidate(session: &mut InputSession, candidate: &str) {
    session.replace_field(candidate);
}
