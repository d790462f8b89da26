use fs_err as fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Per-run artifact store. When enabled via flags, every phase's prompt
/// and raw response are saved under `<reports>/runs/<run-id>/` so a failed
/// run can be inspected after the fact.
pub struct RunLog {
    dir: PathBuf,
    save_request: bool,
    save_response: bool,
}

impl RunLog {
    pub fn new(reports_dir: &Path, save_request: bool, save_response: bool) -> Self {
        let dir = reports_dir.join("runs").join(Uuid::new_v4().to_string());
        Self { dir, save_request, save_response }
    }

    pub fn save_phase(&self, phase: &str, prompt: &str, response: &str) -> anyhow::Result<()> {
        if !self.save_request && !self.save_response {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        if self.save_request {
            fs::write(self.dir.join(format!("{phase}.prompt.txt")), prompt)?;
        }
        if self.save_response {
            fs::write(self.dir.join(format!("{phase}.response.txt")), response)?;
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saves_only_requested_artifacts() {
        let tmp = TempDir::new().unwrap();
        let log = RunLog::new(tmp.path(), true, false);
        log.save_phase("identity", "the prompt", "the response").unwrap();

        assert!(log.dir().join("identity.prompt.txt").exists());
        assert!(!log.dir().join("identity.response.txt").exists());
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let log = RunLog::new(tmp.path(), false, false);
        log.save_phase("identity", "p", "r").unwrap();
        assert!(!log.dir().exists());
    }
}
