use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no messages found at {url}")]
pub struct MessagesEmptyError {
    pub url: String,
}

/// Splits fetched text on `\n` and drops zero-length lines.
///
/// Lines are otherwise kept verbatim; a trailing `\r` stays part of its line.
pub fn parse_messages(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Validated, non-empty list of candidate messages fetched from one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePool {
    url: String,
    messages: Vec<String>,
}

impl MessagePool {
    pub fn new(url: impl Into<String>, messages: Vec<String>) -> Result<Self, MessagesEmptyError> {
        let url = url.into();
        if messages.is_empty() {
            return Err(MessagesEmptyError { url });
        }
        Ok(Self { url, messages })
    }

    pub fn from_text(url: impl Into<String>, text: &str) -> Result<Self, MessagesEmptyError> {
        Self::new(url, parse_messages(text))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Uniformly draws one message.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let index = rng.random_range(0..self.messages.len());
        &self.messages[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn blank_lines_are_dropped() {
        assert_eq!(parse_messages("a\n\nb\n\n\nc\n"), vec!["a", "b", "c"]);
        assert_eq!(parse_messages("a\r\nb"), vec!["a\r", "b"]);
        assert_eq!(parse_messages(" \n"), vec![" "]);
    }

    #[test]
    fn empty_text_is_an_error_carrying_the_url() {
        assert_eq!(
            MessagePool::from_text("messages", "\n\n"),
            Err(MessagesEmptyError {
                url: "messages".to_string()
            })
        );
        assert!(MessagePool::from_text("messages", "").is_err());
    }

    #[test]
    fn choose_covers_every_message() {
        let pool = MessagePool::from_text("u", "a\nb\nc").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(pool.choose(&mut rng).to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn choose_is_reproducible_with_a_seed() {
        let pool = MessagePool::from_text("u", "0\n1\n2\n3\n4\n5\n6\n7\n8\n9").unwrap();
        let draws = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20).map(|_| pool.choose(&mut rng).to_string()).collect::<Vec<_>>()
        };
        assert_eq!(draws(11), draws(11));
    }
}
