use ego_tree::NodeId;
use message_loader_core::{ElementGroup, MessagePool, SourceTasks};
use rand::Rng;

use crate::{decode_text, Fetcher, Page, TaskError, TaskSuccess};

/// Fetches one source URL and writes a random message into each of its element groups.
#[derive(Debug, Clone)]
pub struct FetchTask {
    url: String,
    groups: Vec<ElementGroup<NodeId>>,
}

impl FetchTask {
    pub fn new(source: SourceTasks<NodeId>) -> Self {
        let (url, groups) = source.into_parts();
        Self { url, groups }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn groups(&self) -> &[ElementGroup<NodeId>] {
        &self.groups
    }

    /// Issues the single fetch for this URL and validates the message pool.
    pub async fn load<F>(&self, fetcher: &F) -> Result<MessagePool, TaskError>
    where
        F: Fetcher + ?Sized,
    {
        let output = fetcher.fetch(&self.url).await?;
        let decoded = decode_text(&output.bytes, output.metadata.content_type.as_deref())
            .map_err(|source| TaskError::Decode {
                url: self.url.clone(),
                source,
            })?;
        Ok(MessagePool::from_text(self.url.clone(), &decoded.text)?)
    }

    /// Draws one message per group and writes it into every member.
    ///
    /// Membership is checked before anything is written, so a mismatch leaves
    /// the page untouched.
    pub fn apply<R>(
        &self,
        pool: &MessagePool,
        page: &mut Page,
        rng: &mut R,
    ) -> Result<TaskSuccess, TaskError>
    where
        R: Rng + ?Sized,
    {
        for group in &self.groups {
            group.verify_url(&self.url)?;
        }

        let mut elements = 0;
        for group in &self.groups {
            let message = pool.choose(rng);
            for handle in group.handles() {
                if page.set_inner_html(handle, message) {
                    elements += 1;
                }
            }
        }

        Ok(TaskSuccess {
            groups: self.groups.len(),
            elements,
            messages: pool.len(),
        })
    }

    pub async fn run<F, R>(
        &self,
        fetcher: &F,
        page: &mut Page,
        rng: &mut R,
    ) -> Result<TaskSuccess, TaskError>
    where
        F: Fetcher + ?Sized,
        R: Rng + ?Sized,
    {
        let pool = self.load(fetcher).await?;
        self.apply(&pool, page, rng)
    }
}
