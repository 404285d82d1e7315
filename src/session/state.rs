/// Lifecycle states of a recording session.
///
/// Transitions are the only mutator of session state and are validated
/// against the table in [`SessionState::can_transition`]. `Done` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Armed,
    Encoding,
    Stopping,
    PostProcessing,
    Done,
    Failed,
}

impl SessionState {
    pub fn can_transition(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Armed)
                | (Armed, Encoding)
                | (Encoding, Stopping)
                | (Stopping, PostProcessing)
                | (PostProcessing, Done)
                // Any non-terminal state can fail.
                | (Idle, Failed)
                | (Armed, Failed)
                | (Encoding, Failed)
                | (Stopping, Failed)
                | (PostProcessing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed)
    }
}
