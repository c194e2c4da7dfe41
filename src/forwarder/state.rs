use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwarderState {
    Created,
    Started,
    StartFailed,
    Stopped,
}

impl fmt::Display for ForwarderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForwarderState::Created => "created",
            ForwarderState::Started => "started",
            ForwarderState::StartFailed => "start-failed",
            ForwarderState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
