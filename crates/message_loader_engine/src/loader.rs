use std::sync::mpsc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use loader_logging::{loader_debug, loader_error, loader_info};
use message_loader_core::{group_targets, update, Effect, LoaderState, Markers, Msg};
use rand::Rng;

use crate::{Document, FetchTask, Fetcher, LoaderError, LoaderEvent, Page, TaskOutcome};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: LoaderEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<LoaderEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<LoaderEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: LoaderEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: LoaderEvent) {}
}

/// Result of one settled run.
#[derive(Debug)]
pub struct RunReport {
    pub page: Page,
    /// One entry per source URL, in settlement order.
    pub outcomes: Vec<TaskOutcome>,
    pub state: LoaderState,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn outcome(&self, url: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.url == url)
    }
}

pub struct Loader<F> {
    fetcher: F,
    markers: Markers,
}

impl<F: Fetcher> Loader<F> {
    pub fn new(fetcher: F, markers: Markers) -> Self {
        Self { fetcher, markers }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Waits for the document, then fetches every distinct source once and
    /// fills the marked elements.
    ///
    /// Task failures are logged and reported in the returned outcomes; they
    /// never abort sibling tasks. `LoaderEvent::Done` is emitted once all
    /// tasks settled.
    pub async fn run<R>(
        &self,
        document: Document,
        rng: &mut R,
        sink: &dyn EventSink,
    ) -> Result<RunReport, LoaderError>
    where
        R: Rng + ?Sized,
    {
        let mut state = LoaderState::new();
        if document.is_loading() {
            loader_debug!("document still loading, waiting for content");
        }
        let mut page = document.ready().await?;

        let targets = page.targets(&self.markers)?;
        let plan = group_targets(targets);
        loader_info!(
            "found {} target elements across {} sources",
            plan.element_count(),
            plan.len()
        );
        sink.emit(LoaderEvent::Started {
            urls: plan.len(),
            elements: plan.element_count(),
        });

        let mut tasks: Vec<FetchTask> = plan.into_iter().map(FetchTask::new).collect();
        let mut outcomes = Vec::with_capacity(tasks.len());
        let mut pending = FuturesUnordered::new();

        let (next, effects) = update(state, Msg::DocumentReady { tasks: tasks.len() });
        state = next;
        for effect in effects {
            match effect {
                Effect::BeginFetches => {
                    for task in tasks.drain(..) {
                        let fetcher = &self.fetcher;
                        pending.push(async move {
                            loader_debug!("fetching messages from {}", task.url());
                            let loaded = task.load(fetcher).await;
                            (task, loaded)
                        });
                    }
                }
                Effect::EmitDone => emit_done(sink, state),
            }
        }

        while let Some((task, loaded)) = pending.next().await {
            let result = match loaded {
                Ok(pool) => task.apply(&pool, &mut page, rng),
                Err(err) => Err(err),
            };
            match &result {
                Ok(success) => loader_info!(
                    "{}: wrote {} groups ({} elements) from {} messages",
                    task.url(),
                    success.groups,
                    success.elements,
                    success.messages
                ),
                Err(err) => loader_error!("Random message loader error with url {}: {}", task.url(), err),
            }

            let (next, effects) = update(
                state,
                Msg::TaskSettled {
                    succeeded: result.is_ok(),
                },
            );
            state = next;

            let outcome = TaskOutcome {
                url: task.url().to_string(),
                result,
            };
            sink.emit(LoaderEvent::TaskSettled(outcome.clone()));
            outcomes.push(outcome);

            for effect in effects {
                if effect == Effect::EmitDone {
                    emit_done(sink, state);
                }
            }
        }

        Ok(RunReport {
            page,
            outcomes,
            state,
        })
    }
}

fn emit_done(sink: &dyn EventSink, state: LoaderState) {
    if let LoaderState::Settled { succeeded, failed } = state {
        loader_info!("settled: {} sources succeeded, {} failed", succeeded, failed);
    }
    sink.emit(LoaderEvent::Done);
}
