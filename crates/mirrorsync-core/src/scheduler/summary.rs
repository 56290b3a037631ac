use serde::Serialize;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Joint download/verify passes executed.
    pub passes: u32,
    pub verified: usize,
    /// Filenames that ended `Failed`, in registry order.
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Process exit code: non-zero when any file failed.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
