use std::collections::HashSet;

/// Hard limit imposed by the xlsx format.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Collision-free, length-bounded sheet names. One instance per output
/// artifact; sharing an allocator across artifacts starves later ones of
/// short names.
#[derive(Debug, Default)]
pub struct SheetNameAllocator {
    used: HashSet<String>,
}

impl SheetNameAllocator {
    pub fn new() -> SheetNameAllocator {
        SheetNameAllocator::default()
    }

    /// Marks a name as taken without allocating it, for sheets that already
    /// exist in the artifact.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    /// Truncates the candidate, then probes `_1`, `_2`, ... suffixes (with
    /// the base re-truncated to make room) until an unused name is found.
    pub fn allocate(&mut self, candidate: &str) -> String {
        let base = truncate(candidate, MAX_SHEET_NAME_LEN);
        let mut name = base.clone();
        let mut counter = 1u32;
        while self.used.contains(&name) {
            let suffix = format!("_{counter}");
            name = format!(
                "{}{suffix}",
                truncate(&base, MAX_SHEET_NAME_LEN.saturating_sub(suffix.len()))
            );
            counter += 1;
        }
        self.used.insert(name.clone());
        name
    }
}

fn truncate(name: &str, max_chars: usize) -> String {
    name.chars().take(max_chars).collect()
}
