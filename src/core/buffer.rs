//! Command buffer
//!
//! Accumulates the not-yet-submitted command line. The controller keeps it in
//! lockstep with what has been echoed after the last prompt.

/// Pending input text between submissions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    text: String,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one character
    pub fn append(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Append pasted text verbatim
    pub fn append_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Remove the last character. No-op on an empty buffer.
    pub fn delete_last(&mut self) -> Option<char> {
        self.text.pop()
    }

    /// Take the contents, leaving the buffer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
