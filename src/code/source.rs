use std::sync::Arc;

/// Read-only access to the code listing being animated.
pub trait CodeSource {
    /// All lines, without trailing newlines.
    fn lines(&self) -> &[String];

    fn line_count(&self) -> u32 {
        u32::try_from(self.lines().len()).unwrap_or(u32::MAX)
    }

    /// Content of 1-based line `n`, or `""` when out of range.
    fn line(&self, n: u32) -> &str {
        if n == 0 {
            return "";
        }
        self.lines()
            .get((n - 1) as usize)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// In-memory code listing. Cheap to clone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeListing {
    lines: Arc<[String]>,
}

impl CodeListing {
    /// Split `text` into lines. Tabs are expanded to four spaces; a trailing newline does not
    /// produce an extra empty line.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text
            .lines()
            .map(|l| l.trim_end_matches('\r').replace('\t', "    "))
            .collect();
        Self {
            lines: lines.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() || self.lines.iter().all(|l| l.trim().is_empty())
    }
}

impl CodeSource for CodeListing {
    fn lines(&self) -> &[String] {
        &self.lines
    }
}
