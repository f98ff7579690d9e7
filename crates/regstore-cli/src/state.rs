use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use regstore_events::{FanoutSink, InMemoryEventLog, RegistryEvent, TracingSink};
use regstore_guard::GuardConfig;
use regstore_registry::{FileRegistry, FileSnapshot, PostRegistry, PostSnapshot, RegistryContext};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything the CLI persists between invocations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateFile {
    pub guard: GuardConfig,
    pub posts: PostSnapshot,
    pub files: FileSnapshot,
    pub events: Vec<RegistryEvent>,
}

impl StateFile {
    pub fn new(guard: GuardConfig) -> Self {
        Self {
            guard,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| {
            format!(
                "reading state {} (run `regstore init` first?)",
                path.display()
            )
        })?;
        serde_json::from_str(&text).with_context(|| format!("parsing state {}", path.display()))
    }

    /// Write the state, replacing the file only once the new content is
    /// fully on disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        info!(path = %path.display(), events = self.events.len(), "state saved");
        Ok(())
    }
}

/// Live registries opened from a [`StateFile`].
pub struct Session {
    pub guard: GuardConfig,
    pub posts: PostRegistry,
    pub files: FileRegistry,
    pub log: Arc<InMemoryEventLog>,
}

impl Session {
    pub fn open(state: StateFile) -> anyhow::Result<Self> {
        let guard = state.guard.build().context("building access guard")?;
        let log = Arc::new(InMemoryEventLog::from_events(state.events));
        let sink = FanoutSink::new()
            .with(log.clone())
            .with(Arc::new(TracingSink));
        let ctx = RegistryContext::new(guard).with_sink(Arc::new(sink));

        let posts = PostRegistry::from_snapshot(ctx.clone(), state.posts)
            .context("loading post registry")?;
        let files =
            FileRegistry::from_snapshot(ctx, state.files).context("loading file registry")?;

        Ok(Self {
            guard: state.guard,
            posts,
            files,
            log,
        })
    }

    pub fn to_state(&self) -> anyhow::Result<StateFile> {
        Ok(StateFile {
            guard: self.guard.clone(),
            posts: self.posts.snapshot()?,
            files: self.files.snapshot()?,
            events: self.log.events(),
        })
    }
}
