use crate::{Effect, LoaderState, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// `EmitDone` is produced exactly once, on the transition into `Settled`.
/// Messages that do not fit the current state are ignored.
pub fn update(state: LoaderState, msg: Msg) -> (LoaderState, Vec<Effect>) {
    match (state, msg) {
        (LoaderState::AwaitingDocument, Msg::DocumentReady { tasks: 0 }) => (
            LoaderState::Settled {
                succeeded: 0,
                failed: 0,
            },
            vec![Effect::EmitDone],
        ),
        (LoaderState::AwaitingDocument, Msg::DocumentReady { tasks }) => (
            LoaderState::Running {
                outstanding: tasks,
                succeeded: 0,
                failed: 0,
            },
            vec![Effect::BeginFetches],
        ),
        (
            LoaderState::Running {
                outstanding,
                succeeded,
                failed,
            },
            Msg::TaskSettled { succeeded: ok },
        ) => {
            let succeeded = succeeded + usize::from(ok);
            let failed = failed + usize::from(!ok);
            if outstanding <= 1 {
                (LoaderState::Settled { succeeded, failed }, vec![Effect::EmitDone])
            } else {
                (
                    LoaderState::Running {
                        outstanding: outstanding - 1,
                        succeeded,
                        failed,
                    },
                    Vec::new(),
                )
            }
        }
        (state, _) => (state, Vec::new()),
    }
}
