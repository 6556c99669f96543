//! Rolling Window for Cross-Fragment Inspection
//!
//! CRITICAL: Memory usage is BOUNDED regardless of response length.
//! This window:
//! - Keeps only the trailing `capacity` characters of everything appended
//! - Counts characters, never bytes, so multi-byte text is never split
//! - Is owned by exactly one streaming exchange
//!
//! The capacity must be at least as long as the longest pattern the
//! classifier has to see in one piece. Anything longer can be evicted
//! before it is evaluated; the window does not check this.

/// Bounded accumulator of trailing text
#[derive(Debug, Clone)]
pub struct RollingWindow {
    /// Current buffered text (always a suffix of the appended history)
    buffer: String,
    /// Maximum characters kept
    capacity: usize,
    /// Characters currently held in `buffer`
    len: usize,
    /// Total characters ever appended
    total_appended: usize,
}

impl RollingWindow {
    /// Create an empty window holding at most `capacity` characters
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
            capacity,
            len: 0,
            total_appended: 0,
        }
    }

    /// Append text, then drop leading characters beyond capacity.
    /// Returns the number of characters appended.
    pub fn add(&mut self, text: &str) -> usize {
        let added = text.chars().count();
        self.buffer.push_str(text);
        self.len += added;
        self.total_appended += added;

        if self.len > self.capacity {
            let excess = self.len - self.capacity;
            match self.buffer.char_indices().nth(excess) {
                Some((cut, _)) => {
                    self.buffer.drain(..cut);
                }
                None => self.buffer.clear(),
            }
            self.len = self.capacity;
        }

        added
    }

    /// Current window contents
    pub fn contents(&self) -> &str {
        &self.buffer
    }

    /// Characters currently held
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum characters held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total characters appended over the window's lifetime
    pub fn total_appended(&self) -> usize {
        self.total_appended
    }
}
