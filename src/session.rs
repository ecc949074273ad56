/// Maximum number of input history entries kept at any time.
pub const HISTORY_CAP: usize = 21;

// ── Multi-line completeness detector ────────────────────────────────────

/// State carried by the completeness detector between submitted lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Top level: each line is checked on its own merits.
    Normal,
    /// Inside an indented/continued block (after a trailing `:` or `\`),
    /// waiting for a blank line to close it.
    InBlock,
}

impl Default for DetectorState {
    fn default() -> Self {
        DetectorState::Normal
    }
}

/// Count occurrences of `needle` in `haystack`, allowing overlaps
/// (four quotes in a row register as two `"""` fences).
fn substr_count(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut pos = 0;
    while let Some(i) = haystack[pos..].find(needle) {
        count += 1;
        pos += i + 1;
    }
    count
}

/// Decide whether the accumulated buffer `text` forms a complete statement.
///
/// `text` is everything typed since the last send and always ends with a
/// newline. Returns the new detector state and the completeness verdict.
///
/// This is a heuristic, not a lexer: bracket and quote counts ignore
/// string/comment context. The paired execution service expects exactly
/// this behavior, so the rules must not be tightened.
pub fn statement_complete(state: DetectorState, text: &str) -> (DetectorState, bool) {
    if state == DetectorState::InBlock {
        if !text.ends_with("\n\n") {
            return (DetectorState::InBlock, false);
        }
        // Blank line closes the block; fall through and re-check the
        // whole text for any other open construct.
    }

    if text == "\n" {
        return (DetectorState::Normal, true);
    }

    // Trailing `:` opens a block, trailing `\` continues the line.
    // Checking the byte before the final newline is safe for multibyte
    // input: no UTF-8 continuation byte equals b':' or b'\\'.
    let bytes = text.as_bytes();
    if bytes.len() >= 2 && (bytes[bytes.len() - 2] == b':' || bytes[bytes.len() - 2] == b'\\') {
        return (DetectorState::InBlock, false);
    }

    if substr_count(text, "(") > substr_count(text, ")")
        || substr_count(text, "[") > substr_count(text, "]")
        || substr_count(text, "{") > substr_count(text, "}")
    {
        return (DetectorState::Normal, false);
    }

    if substr_count(text, "\"\"\"") % 2 != 0 || substr_count(text, "'''") % 2 != 0 {
        return (DetectorState::Normal, false);
    }

    (DetectorState::Normal, true)
}

// ── Input history ───────────────────────────────────────────────────────

/// Previously submitted lines, newest first, capped at [`HISTORY_CAP`].
///
/// The cursor selects which entry populates the input line while browsing:
/// −1 means "not browsing" (a fresh, empty line), 0 the most recent entry.
#[derive(Debug)]
pub struct History {
    entries: Vec<String>,
    cursor: isize,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: -1,
        }
    }

    /// Record a submitted line (trailing newline stripped). Every entered
    /// line is recorded, including fragments of a multi-line block.
    pub fn push(&mut self, line: &str) {
        let line = line.strip_suffix('\n').unwrap_or(line);
        self.entries.insert(0, line.to_string());
        self.entries.truncate(HISTORY_CAP);
    }

    /// Move one entry toward the oldest; returns the entry now selected.
    pub fn up(&mut self) -> Option<&str> {
        if self.cursor < self.entries.len() as isize - 1 {
            self.cursor += 1;
        }
        self.current()
    }

    /// Move one entry back toward the fresh line; `None` once at −1.
    pub fn down(&mut self) -> Option<&str> {
        if self.cursor > -1 {
            self.cursor -= 1;
        }
        self.current()
    }

    /// The entry under the cursor, or `None` when not browsing.
    pub fn current(&self) -> Option<&str> {
        if self.cursor < 0 {
            None
        } else {
            self.entries.get(self.cursor as usize).map(String::as_str)
        }
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = -1;
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

// ── Console session state ───────────────────────────────────────────────

/// Outcome of submitting one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The accumulated statement is complete; send this text.
    Exec(String),
    /// The statement is still open; the line was absorbed into the buffer.
    Pending,
    /// Enter on an empty line with nothing buffered; nothing to send.
    Empty,
}

/// Client-side console state: pending input buffer, input history, and
/// detector state. Pure — no I/O, no knowledge of the transport.
#[derive(Debug, Default)]
pub struct ConsoleState {
    buffer: String,
    detector: DetectorState,
    history: History,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The prompt for the next input line.
    pub fn prompt(&self) -> &'static str {
        if self.buffer.is_empty() {
            ">>> "
        } else {
            "... "
        }
    }

    /// True while a multi-line statement is being assembled.
    pub fn pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// The accumulated, not-yet-sent buffer. Always empty or
    /// newline-terminated.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn detector(&self) -> DetectorState {
        self.detector
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Submit one entered line (without its newline) and decide what, if
    /// anything, should be sent to the interpreter.
    pub fn submit_line(&mut self, line: &str) -> Submission {
        let mut entered = line.to_string();
        entered.push('\n');

        self.history.push(&entered);

        let text = format!("{}{}", self.buffer, entered);
        let (next, complete) = statement_complete(self.detector, &text);
        self.detector = next;

        if !complete {
            self.buffer = text;
            return Submission::Pending;
        }

        self.buffer.clear();
        self.history.reset_cursor();

        if text == "\n" {
            Submission::Empty
        } else {
            Submission::Exec(text)
        }
    }

    /// Discard the pending buffer and detector state without sending.
    /// History is untouched.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.detector = DetectorState::Normal;
    }
}
