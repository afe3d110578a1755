//! Splitting messages into size-limited chunks.

/// Splits a message into chunks a channel accepts.
pub trait MessageFormatter: Send + Sync {
    /// Returns the chunks to send, in order. Blank input yields no chunks.
    fn split_message(&self, message: &str) -> Vec<String>;
}

/// Default maximum chunk length, in characters.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 2000;

/// Packs words into chunks of at most `max_length` characters.
///
/// Line breaks are kept where they fit inside a chunk. A chunk boundary
/// replaces the whitespace it falls on. Words longer than the limit are
/// cut at the limit.
#[derive(Debug, Clone)]
pub struct ChunkingFormatter {
    max_length: usize,
}

impl ChunkingFormatter {
    /// Creates a formatter. A zero limit is raised to one.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for ChunkingFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_LENGTH)
    }
}

impl MessageFormatter for ChunkingFormatter {
    fn split_message(&self, message: &str) -> Vec<String> {
        if message.trim().is_empty() {
            return Vec::new();
        }
        if message.chars().count() <= self.max_length {
            return vec![message.to_string()];
        }

        let mut packer = Packer::new(self.max_length);
        for (line_no, line) in message.lines().enumerate() {
            let mut separator = if line_no == 0 { "" } else { "\n" };
            for word in line.split_whitespace() {
                packer.push(separator, word);
                separator = " ";
            }
        }
        packer.finish()
    }
}

struct Packer {
    max: usize,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl Packer {
    fn new(max: usize) -> Self {
        Self {
            max,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    fn push(&mut self, separator: &str, word: &str) {
        let word_len = word.chars().count();

        if word_len > self.max {
            self.flush();
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(self.max).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    self.chunks.push(piece.iter().collect());
                } else {
                    self.current = piece.iter().collect();
                    self.current_len = piece.len();
                }
            }
            return;
        }

        if self.current_len == 0 {
            self.current.push_str(word);
            self.current_len = word_len;
        } else if self.current_len + 1 + word_len <= self.max {
            self.current.push_str(separator);
            self.current.push_str(word);
            self.current_len += 1 + word_len;
        } else {
            self.flush();
            self.current.push_str(word);
            self.current_len = word_len;
        }
    }

    fn flush(&mut self) {
        if self.current_len > 0 {
            self.chunks.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}
