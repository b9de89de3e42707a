/// Back/forward stack over location fragments, as a browser keeps for hash
/// navigation. The player never reads it; the shell replays entries as
/// `HashChanged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavHistory {
    entries: Vec<String>,
    index: usize,
}

impl Default for NavHistory {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl NavHistory {
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    #[must_use]
    pub fn current(&self) -> &str {
        self.entries
            .get(self.index)
            .map_or("", String::as_str)
    }

    /// Record a newly shown fragment. Drops forward entries; a repeat of the
    /// current entry is ignored.
    pub fn push(&mut self, fragment: &str) {
        if self.current() == fragment {
            return;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(fragment.to_string());
        self.index = self.entries.len() - 1;
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn back(&mut self) -> Option<String> {
        if !self.can_go_back() {
            return None;
        }
        self.index -= 1;
        Some(self.current().to_string())
    }

    pub fn forward(&mut self) -> Option<String> {
        if !self.can_go_forward() {
            return None;
        }
        self.index += 1;
        Some(self.current().to_string())
    }
}

/// Address-bar spelling of a fragment.
#[must_use]
pub fn display_fragment(fragment: &str) -> String {
    if fragment.is_empty() {
        "#/".to_string()
    } else {
        format!("#{fragment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_then_push_discards_forward_entries() {
        let mut history = NavHistory::new("");
        history.push("/module/basics");
        history.push("/module/basics/lesson/setup");
        assert_eq!(history.back().as_deref(), Some("/module/basics"));
        assert!(history.can_go_forward());

        history.push("/settings");
        assert!(!history.can_go_forward());
        assert_eq!(history.back().as_deref(), Some("/module/basics"));
        assert_eq!(history.back().as_deref(), Some(""));
        assert_eq!(history.back(), None);
    }

    #[test]
    fn replaying_an_entry_does_not_grow_the_stack() {
        let mut history = NavHistory::new("");
        history.push("/progress");
        let previous = history.back().unwrap();
        // The player echoes the fragment it was sent back to.
        history.push(&previous);
        assert_eq!(history.forward().as_deref(), Some("/progress"));
    }

    #[test]
    fn home_fragment_displays_as_root() {
        assert_eq!(display_fragment(""), "#/");
        assert_eq!(display_fragment("/settings"), "#/settings");
    }
}
