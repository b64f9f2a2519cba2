//! Text token producer.

use crate::TextInput;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default pause between two pushed tokens.
pub const DEFAULT_TOKEN_DELAY: Duration = Duration::from_millis(10);

/// Splits text into tokens of "leading whitespace + one word".
///
/// Concatenating the tokens gives back the input: whitespace after the last
/// word is appended to the last token, and whitespace-only text is returned
/// as a single token.
pub fn split_tokens(text: &str) -> Vec<&str> {
    let mut bounds: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    let mut in_word = false;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                bounds.push((start, i));
                start = i;
                in_word = false;
            }
        } else {
            in_word = true;
        }
    }

    if start < text.len() {
        match bounds.last_mut() {
            Some(last) if !in_word => last.1 = text.len(),
            _ => bounds.push((start, text.len())),
        }
    }

    bounds.into_iter().map(|(s, e)| &text[s..e]).collect()
}

/// Pushes the tokens of a text into a synthesizer at a steady pace, emulating
/// a live dictation feed.
#[derive(Debug, Clone)]
pub struct TokenProducer {
    delay: Duration,
}

impl Default for TokenProducer {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_DELAY)
    }
}

impl TokenProducer {
    /// Creates a producer pausing `delay` after every token.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Runs the producer as its own task. The task resolves to the number of
    /// tokens pushed.
    pub fn spawn(self, text: String, input: TextInput) -> JoinHandle<usize> {
        tokio::spawn(async move { self.run(&text, input).await })
    }

    /// Pushes every token of `text`, then closes the input.
    ///
    /// Stops early if the synthesizer stops reading.
    pub async fn run(&self, text: &str, input: TextInput) -> usize {
        let mut pushed = 0;
        for token in split_tokens(text) {
            if input.push(token).is_err() {
                debug!(pushed, "producer: synthesizer input closed early");
                break;
            }
            pushed += 1;
            tokio::time::sleep(self.delay).await;
        }
        input.close();
        debug!(pushed, "producer: input closed");
        pushed
    }
}
