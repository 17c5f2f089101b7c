use crate::utils::MAX_ASSEMBLED_RECORD;

/// Rejoins JSON records that a remote terminal wrapped over several lines.
///
/// Lines that do not start a JSON object pass straight through so the
/// caller can classify them.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one inbound line; returns a complete record when one is ready.
    pub fn push(&mut self, line: &str) -> Option<String> {
        let trimmed = line.trim();

        if self.pending.is_empty() {
            if trimmed.starts_with('{') && !is_json(trimmed) {
                self.pending
                    .push_str(line.trim_start().trim_end_matches(['\r', '\n']));
                return None;
            }
            return Some(line.to_owned());
        }

        if is_json(trimmed) {
            // A self-contained record supersedes the dangling fragment.
            self.pending.clear();
            return Some(trimmed.to_owned());
        }

        self.pending.push_str(line.trim_end_matches(['\r', '\n']));
        if is_json(self.pending.trim_end()) {
            let record = std::mem::take(&mut self.pending);
            return Some(record.trim_end().to_owned());
        }

        if self.pending.len() > MAX_ASSEMBLED_RECORD {
            self.pending.clear();
            if trimmed.starts_with('{') {
                self.pending.push_str(trimmed);
            }
        }
        None
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn is_json(text: &str) -> bool {
    text.ends_with('}') && serde_json::from_str::<serde_json::Value>(text).is_ok()
}
