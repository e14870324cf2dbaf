//! Checkpoint cadence and rotation.

use super::state::CheckpointMetadata;
use crate::agent::PolicyAgent;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CHECKPOINT_PREFIX: &str = "checkpoint_episode_";

/// When and where checkpoints are written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointPolicy {
    /// Directory to store checkpoints, created on first save
    pub checkpoint_dir: PathBuf,
    /// Save whenever the episode count is a multiple of this (None disables)
    pub every_episodes: Option<u64>,
    /// Keep only the last N checkpoints (0 = keep all)
    pub keep_last: usize,
    /// File extension of the checkpoint written by the agent
    pub extension: String,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("checkpoints"),
            every_episodes: None,
            keep_last: 0,
            extension: "bin".to_string(),
        }
    }
}

impl CheckpointPolicy {
    /// Create a policy writing into `checkpoint_dir`, initially disabled.
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            ..Default::default()
        }
    }

    /// A policy that never saves.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Set save frequency in episodes.
    pub fn every(mut self, episodes: u64) -> Self {
        self.every_episodes = (episodes > 0).then_some(episodes);
        self
    }

    /// Set number of checkpoints to keep.
    pub fn keep_last(mut self, n: usize) -> Self {
        self.keep_last = n;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.every_episodes.is_some()
    }

    /// `{checkpoint_dir}/checkpoint_episode_{episode_count}.{extension}`
    pub fn checkpoint_path(&self, episode_count: u64) -> PathBuf {
        self.checkpoint_dir.join(format!(
            "{}{}.{}",
            CHECKPOINT_PREFIX, episode_count, self.extension
        ))
    }
}

/// Metadata sidecar path for a checkpoint file.
fn metadata_path(checkpoint: &Path) -> PathBuf {
    checkpoint.with_extension("meta.json")
}

/// Manages checkpoint lifecycle for one training run.
///
/// # Example
///
/// ```ignore
/// let policy = CheckpointPolicy::new("./checkpoints").every(100).keep_last(3);
/// let mut manager = CheckpointManager::new(policy);
///
/// // At the end of every epoch:
/// if let Some(path) = manager.maybe_save(&agent, &metadata)? {
///     println!("Saved checkpoint: {}", path.display());
/// }
/// ```
pub struct CheckpointManager {
    policy: CheckpointPolicy,
    last_saved: Option<u64>,
}

impl CheckpointManager {
    pub fn new(policy: CheckpointPolicy) -> Self {
        Self {
            policy,
            last_saved: None,
        }
    }

    pub fn policy(&self) -> &CheckpointPolicy {
        &self.policy
    }

    /// Save if the episode count is on the cadence and was not saved yet.
    ///
    /// Returns the path to the saved checkpoint, or None if no save was performed.
    pub fn maybe_save<A: PolicyAgent + ?Sized>(
        &mut self,
        agent: &A,
        metadata: &CheckpointMetadata,
    ) -> Result<Option<PathBuf>> {
        let Some(every) = self.policy.every_episodes else {
            return Ok(None);
        };
        let count = metadata.episode_count;
        if count == 0 || count % every != 0 || self.last_saved == Some(count) {
            return Ok(None);
        }

        self.save(agent, metadata).map(Some)
    }

    /// Force save a checkpoint for the metadata's episode count.
    pub fn save<A: PolicyAgent + ?Sized>(
        &mut self,
        agent: &A,
        metadata: &CheckpointMetadata,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.policy.checkpoint_dir)?;

        let path = self.policy.checkpoint_path(metadata.episode_count);
        agent.save_checkpoint(&path)?;
        metadata.write(&metadata_path(&path))?;
        self.last_saved = Some(metadata.episode_count);
        tracing::info!(
            path = %path.display(),
            episodes = metadata.episode_count,
            "Saved checkpoint"
        );

        if self.policy.keep_last > 0 {
            self.cleanup_old_checkpoints()?;
        }

        Ok(path)
    }

    /// List checkpoint files ordered by episode count.
    pub fn list_checkpoints(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.policy.checkpoint_dir) {
            Ok(e) => e,
            Err(_) => return Ok(Vec::new()),
        };

        let suffix = format!(".{}", self.policy.extension);
        let mut checkpoints: Vec<(u64, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter_map(|p| {
                let episode = p
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_prefix(CHECKPOINT_PREFIX))
                    .and_then(|n| n.strip_suffix(&suffix))
                    .and_then(|n| n.parse::<u64>().ok())?;
                Some((episode, p))
            })
            .collect();

        checkpoints.sort_by_key(|(episode, _)| *episode);
        Ok(checkpoints.into_iter().map(|(_, p)| p).collect())
    }

    /// Most recent checkpoint, if any.
    pub fn latest_checkpoint(&self) -> Result<Option<PathBuf>> {
        Ok(self.list_checkpoints()?.pop())
    }

    /// Read the metadata written alongside `checkpoint`.
    pub fn load_metadata(&self, checkpoint: &Path) -> Result<CheckpointMetadata> {
        CheckpointMetadata::read(&metadata_path(checkpoint))
    }

    /// Remove old checkpoints, keeping only the last N.
    fn cleanup_old_checkpoints(&self) -> Result<()> {
        let checkpoints = self.list_checkpoints()?;
        let excess = checkpoints.len().saturating_sub(self.policy.keep_last);

        for old in checkpoints.into_iter().take(excess) {
            for path in [metadata_path(&old), old] {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), "Failed to remove old checkpoint: {}", e);
                } else {
                    tracing::debug!(path = %path.display(), "Removed old checkpoint");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Transition;
    use crate::RlearnError;
    use ndarray::Array2;

    /// Writes a fixed payload wherever it is asked to save.
    struct MockAgent {
        data: Vec<u8>,
    }

    impl PolicyAgent for MockAgent {
        fn select_action(&mut self, states: &Array2<f32>, _step: usize) -> Result<Array2<f32>> {
            Ok(Array2::zeros((states.nrows(), 1)))
        }

        fn observe_transition(&mut self, _t: &Transition<'_>, _e: usize, _s: usize) -> Result<()> {
            Ok(())
        }

        fn save_checkpoint(&self, path: &Path) -> Result<()> {
            fs::write(path, &self.data)?;
            Ok(())
        }

        fn save_final(&self, path: &Path) -> Result<()> {
            self.save_checkpoint(path)
        }
    }

    fn metadata(episodes: u64) -> CheckpointMetadata {
        CheckpointMetadata::new(0, episodes, episodes * 10, None)
    }

    #[test]
    fn test_policy_builder() {
        let policy = CheckpointPolicy::new("./test")
            .every(50)
            .keep_last(10)
            .with_extension("pt");

        assert_eq!(policy.checkpoint_dir, PathBuf::from("./test"));
        assert_eq!(policy.every_episodes, Some(50));
        assert_eq!(policy.keep_last, 10);
        assert_eq!(
            policy.checkpoint_path(150),
            PathBuf::from("./test/checkpoint_episode_150.pt")
        );
        assert!(!CheckpointPolicy::disabled().is_enabled());
        assert!(!CheckpointPolicy::new("x").every(0).is_enabled());
    }

    #[test]
    fn test_maybe_save_respects_cadence() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CheckpointManager::new(CheckpointPolicy::new(dir.path()).every(5));
        let agent = MockAgent { data: vec![1, 2, 3] };

        assert!(manager.maybe_save(&agent, &metadata(0)).unwrap().is_none());
        assert!(manager.maybe_save(&agent, &metadata(3)).unwrap().is_none());
        assert!(manager.maybe_save(&agent, &metadata(5)).unwrap().is_some());
        // Same episode count at the next epoch end is not saved twice.
        assert!(manager.maybe_save(&agent, &metadata(5)).unwrap().is_none());
        assert!(manager.maybe_save(&agent, &metadata(10)).unwrap().is_some());
    }

    #[test]
    fn test_save_creates_nested_dirs_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut manager = CheckpointManager::new(CheckpointPolicy::new(&nested).every(1));
        let agent = MockAgent { data: vec![9, 8] };

        let path = manager.save(&agent, &metadata(7)).unwrap();
        assert_eq!(path, nested.join("checkpoint_episode_7.bin"));
        assert_eq!(fs::read(&path).unwrap(), vec![9, 8]);

        let meta = manager.load_metadata(&path).unwrap();
        assert_eq!(meta.episode_count, 7);
        assert_eq!(meta.total_steps, 70);
    }

    #[test]
    fn test_cleanup_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let policy = CheckpointPolicy::new(dir.path()).every(1).keep_last(2);
        let mut manager = CheckpointManager::new(policy);
        let agent = MockAgent { data: vec![1] };

        for episodes in [8, 9, 10, 11] {
            manager.save(&agent, &metadata(episodes)).unwrap();
        }

        let checkpoints = manager.list_checkpoints().unwrap();
        assert_eq!(checkpoints.len(), 2);
        assert!(checkpoints[0].ends_with("checkpoint_episode_10.bin"));
        assert!(checkpoints[1].ends_with("checkpoint_episode_11.bin"));
        assert!(!dir.path().join("checkpoint_episode_8.meta.json").exists());
        assert_eq!(
            manager.latest_checkpoint().unwrap(),
            Some(dir.path().join("checkpoint_episode_11.bin"))
        );
    }

    #[test]
    fn test_unwritable_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let mut manager = CheckpointManager::new(CheckpointPolicy::new(blocker.join("sub")).every(1));
        let agent = MockAgent { data: vec![] };
        assert!(matches!(
            manager.save(&agent, &metadata(1)),
            Err(RlearnError::Io(_))
        ));
    }
}
