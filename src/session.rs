pub const SEPARATOR: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    File,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub kind: String,
    pub category: Category,
    pub prompt: String,
    pub multiple: bool,
    pub initial: String,
}

impl SessionSpec {
    pub fn new(kind: impl Into<String>, category: Category) -> Self {
        Self {
            kind: kind.into(),
            category,
            prompt: String::new(),
            multiple: false,
            initial: String::new(),
        }
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = initial.into();
        self
    }
}

/// The single in-progress text entry. `cursor` counts chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSession {
    id: SessionId,
    kind: String,
    category: Category,
    prompt: String,
    multiple: bool,
    text: String,
    cursor: usize,
}

impl InputSession {
    pub fn new(id: SessionId, spec: SessionSpec) -> Self {
        let cursor = spec.initial.chars().count();
        Self {
            id,
            kind: spec.kind,
            category: spec.category,
            prompt: spec.prompt,
            multiple: spec.multiple,
            text: spec.initial,
            cursor,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = char_to_byte_idx(&self.text, self.cursor);
        self.text.insert(byte_idx, c);
        self.cursor = self.cursor.saturating_add(1);
    }

    pub fn delete_backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = char_to_byte_idx(&self.text, self.cursor.saturating_sub(1));
        let end = char_to_byte_idx(&self.text, self.cursor);
        self.text.drain(start..end);
        self.cursor = self.cursor.saturating_sub(1);
        true
    }

    pub fn backward_delete_or_updir(&mut self) -> bool {
        if self.category == Category::File && self.char_before_cursor() == Some('/') {
            let before: Vec<char> = self.text.chars().take(self.cursor).collect();
            let slash = self.cursor - 1;
            if let Some(parent) = before[..slash].iter().rposition(|c| *c == '/') {
                let start = char_to_byte_idx(&self.text, parent + 1);
                let end = char_to_byte_idx(&self.text, self.cursor);
                self.text.drain(start..end);
                self.cursor = parent + 1;
                return true;
            }
        }
        self.delete_backward()
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn field(&self) -> &str {
        &self.text[self.field_start()..]
    }

    pub fn replace_field(&mut self, value: &str) {
        let start = self.field_start();
        self.text.truncate(start);
        self.text.push_str(value);
        self.cursor = self.char_len();
    }

    pub fn append_separator(&mut self) {
        self.text.push(SEPARATOR);
        self.cursor = self.char_len();
    }

    /// Drops the part of a file name shadowed by a later `//` or `/~/`, so
    /// `/usr/share/~/notes` becomes `~/notes`. Returns whether anything changed.
    pub fn remove_shadowed_prefix(&mut self) -> bool {
        if self.category != Category::File {
            return false;
        }
        let Some(start) = shadow_start(&self.text) else {
            return false;
        };
        let removed = self.text[..start].chars().count();
        self.text.drain(..start);
        self.cursor = self.cursor.saturating_sub(removed);
        true
    }

    fn field_start(&self) -> usize {
        if !self.multiple {
            return 0;
        }
        self.text
            .rfind(SEPARATOR)
            .map(|idx| idx + SEPARATOR.len_utf8())
            .unwrap_or(0)
    }

    fn char_before_cursor(&self) -> Option<char> {
        self.cursor
            .checked_sub(1)
            .and_then(|idx| self.text.chars().nth(idx))
    }
}

fn shadow_start(text: &str) -> Option<usize> {
    for (idx, _) in text.rmatch_indices('/') {
        let rest = &text[idx + 1..];
        if rest.starts_with('/') {
            return Some(idx + 1);
        }
        if rest == "~" || rest.starts_with("~/") {
            return Some(idx + 1);
        }
    }
    None
}

pub(crate) fn char_to_byte_idx(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}
