use std::collections::HashMap;
use std::fmt;

use crate::TargetElement;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("element grouped under {expected} carries url {actual}")]
pub struct TaskUrlMismatchError {
    pub expected: String,
    pub actual: String,
}

/// Elements that receive the same randomly selected message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementGroup<H> {
    key: Option<String>,
    members: Vec<TargetElement<H>>,
}

impl<H: Copy + fmt::Debug> ElementGroup<H> {
    fn singleton(element: TargetElement<H>) -> Self {
        Self {
            key: None,
            members: vec![element],
        }
    }

    fn keyed(key: String, first: TargetElement<H>) -> Self {
        Self {
            key: Some(key),
            members: vec![first],
        }
    }

    /// Shared group key, `None` for singleton groups.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn members(&self) -> &[TargetElement<H>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; groups are created with their first member.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.members.iter().map(TargetElement::handle)
    }

    /// Checks that every member was marked with `url`.
    pub fn verify_url(&self, url: &str) -> Result<(), TaskUrlMismatchError> {
        match self.members.iter().find(|member| member.url() != url) {
            Some(member) => Err(TaskUrlMismatchError {
                expected: url.to_string(),
                actual: member.url().to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// All element groups depending on one source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTasks<H> {
    url: String,
    groups: Vec<ElementGroup<H>>,
}

impl<H> SourceTasks<H> {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn groups(&self) -> &[ElementGroup<H>] {
        &self.groups
    }

    pub fn element_count(&self) -> usize {
        self.groups.iter().map(|group| group.members.len()).sum()
    }

    pub fn into_parts(self) -> (String, Vec<ElementGroup<H>>) {
        (self.url, self.groups)
    }
}

/// Output of the grouper: one entry per distinct URL in order of first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPlan<H> {
    sources: Vec<SourceTasks<H>>,
}

impl<H> TaskPlan<H> {
    pub fn sources(&self) -> &[SourceTasks<H>] {
        &self.sources
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(SourceTasks::url)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.sources.iter().map(SourceTasks::element_count).sum()
    }

    pub fn get(&self, url: &str) -> Option<&SourceTasks<H>> {
        self.sources.iter().find(|source| source.url == url)
    }
}

impl<H> IntoIterator for TaskPlan<H> {
    type Item = SourceTasks<H>;
    type IntoIter = std::vec::IntoIter<SourceTasks<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.into_iter()
    }
}

struct Partition<H> {
    singles: Vec<ElementGroup<H>>,
    keyed: Vec<ElementGroup<H>>,
    key_index: HashMap<String, usize>,
}

/// Partitions targets by URL, then by group key.
///
/// Within a URL, keyless elements each become a singleton group (document
/// order), followed by one group per distinct key in order of first use.
pub fn group_targets<H, I>(elements: I) -> TaskPlan<H>
where
    H: Copy + fmt::Debug,
    I: IntoIterator<Item = TargetElement<H>>,
{
    let mut order: Vec<(String, Partition<H>)> = Vec::new();
    let mut url_index: HashMap<String, usize> = HashMap::new();

    for element in elements {
        let slot = *url_index.entry(element.url().to_string()).or_insert_with(|| {
            order.push((
                element.url().to_string(),
                Partition {
                    singles: Vec::new(),
                    keyed: Vec::new(),
                    key_index: HashMap::new(),
                },
            ));
            order.len() - 1
        });
        let partition = &mut order[slot].1;

        if !element.has_group_key() {
            partition.singles.push(ElementGroup::singleton(element));
            continue;
        }

        match partition.key_index.get(element.group_key()) {
            Some(&index) => partition.keyed[index].members.push(element),
            None => {
                let key = element.group_key().to_string();
                partition.key_index.insert(key.clone(), partition.keyed.len());
                partition.keyed.push(ElementGroup::keyed(key, element));
            }
        }
    }

    let sources = order
        .into_iter()
        .map(|(url, partition)| {
            let mut groups = partition.singles;
            groups.extend(partition.keyed);
            SourceTasks { url, groups }
        })
        .collect();

    TaskPlan { sources }
}
