use crate::types::Candidate;

/// First candidate, in on-screen order, resolved to `desired_index`.
pub fn select(candidates: &[Candidate], desired_index: usize) -> Option<&Candidate> {
    candidates
        .iter()
        .find(|candidate| candidate.resolution.index() == Some(desired_index))
}

/// Like [`select`], but falls back to the first candidate when nothing
/// resolves to `desired_index`. Returns `None` only for an empty list.
pub fn select_or_first(candidates: &[Candidate], desired_index: usize) -> Option<&Candidate> {
    select(candidates, desired_index).or_else(|| candidates.first())
}
