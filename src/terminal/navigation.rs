//! Command log with previous/next recall
//!
//! The cursor counts backwards from the most recent command: `None` means the
//! user is not navigating, `Some(0)` is the latest command, `Some(1)` the one
//! before it, and so on. It never points past the oldest command.

/// Direction of a recall step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards older commands
    Up,
    /// Towards newer commands, and finally back to an empty line
    Down,
}

#[derive(Debug, Default)]
pub struct CommandLog {
    commands: Vec<String>,
    cursor: Option<usize>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Move the cursor one step and return the recalled command
    pub fn navigate(&mut self, direction: Direction) -> String {
        if self.commands.is_empty() {
            return String::new();
        }

        match direction {
            Direction::Up => {
                let next = self.cursor.map_or(0, |c| c + 1);
                if next < self.commands.len() {
                    self.cursor = Some(next);
                }
            }
            Direction::Down => match self.cursor {
                Some(c) if c > 0 => self.cursor = Some(c - 1),
                _ => {
                    self.cursor = None;
                    return String::new();
                }
            },
        }

        self.recalled().unwrap_or_default()
    }

    /// Command under the cursor, if navigating
    pub fn recalled(&self) -> Option<String> {
        let offset = self.cursor?;
        let index = self.commands.len().checked_sub(1 + offset)?;
        self.commands.get(index).cloned()
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = None;
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn last(&self) -> Option<&str> {
        self.commands.last().map(String::as_str)
    }

    /// The most recent `n` commands, oldest first
    pub fn recent(&self, n: usize) -> &[String] {
        let start = self.commands.len().saturating_sub(n);
        &self.commands[start..]
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
