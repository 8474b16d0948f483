/// Lifecycle of one loader run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderState {
    /// Waiting for the document to finish loading.
    #[default]
    AwaitingDocument,
    /// Fetch tasks are in flight.
    Running {
        outstanding: usize,
        succeeded: usize,
        failed: usize,
    },
    /// Every fetch task has completed, successfully or not.
    Settled { succeeded: usize, failed: usize },
}

impl LoaderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, LoaderState::Settled { .. })
    }

    pub fn outstanding(&self) -> usize {
        match self {
            LoaderState::Running { outstanding, .. } => *outstanding,
            LoaderState::AwaitingDocument | LoaderState::Settled { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    /// The document is ready and grouping produced `tasks` fetch tasks.
    DocumentReady { tasks: usize },
    /// One fetch task completed.
    TaskSettled { succeeded: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start every fetch task concurrently.
    BeginFetches,
    /// Fire the completion notification.
    EmitDone,
}
