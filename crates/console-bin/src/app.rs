//! Command implementations.

use std::sync::Arc;

use chat_reconciler::{
    Destination, EntityId, HttpChatApi, NullSurface, Reconciler, RenderSurface, SnapshotStore,
};
use console_core::{Config, Paths};
use console_storage::{FileStore, KeyValueStore, MemoryStore};
use realtime_transport::{ChannelOptions, TransportManager};
use tracing::{info, warn};

use crate::terminal::{self, TerminalSurface};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

pub struct App {
    config: Config,
    paths: Paths,
    ephemeral: bool,
}

impl App {
    pub fn new(config: Config, paths: Paths, ephemeral: bool) -> Self {
        Self {
            config,
            paths,
            ephemeral,
        }
    }

    /// Sync, then apply live updates until the channel ends or Ctrl-C.
    pub async fn watch(&self) -> AppResult<()> {
        let surface = Arc::new(TerminalSurface::new());
        let mut reconciler = self.reconciler(surface)?;

        let restored = reconciler.load_local();
        let fetched = reconciler.fetch_history().await;
        reconciler.fetch_notifications().await;
        info!(
            restored = restored,
            fetched = fetched,
            unread = reconciler.unread_count(),
            "Initial sync complete"
        );

        let manager = TransportManager::http(
            self.config.api_base_url()?,
            self.config.request_timeout(),
            self.config.auth_token.clone(),
        )?;
        let mut options = ChannelOptions::default().with_poll_interval(self.config.poll_interval());
        if let Some(poll_url) = self.config.poll_url()? {
            options = options.with_poll_url(poll_url);
        }

        let (channel, events) = manager.open(&self.config.realtime_endpoint(), options)?;
        info!(url = %channel.url(), "Watching for live updates");

        tokio::select! {
            _ = reconciler.run(events) => {
                info!("Realtime channel ended");
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Shutting down");
            }
        }

        channel.close();
        Ok(())
    }

    /// Fetch history and print every conversation.
    pub async fn history(&self) -> AppResult<()> {
        let mut reconciler = self.reconciler(Arc::new(NullSurface))?;
        reconciler.load_local();
        reconciler.fetch_history().await;

        terminal::print_conversations(reconciler.conversations());
        Ok(())
    }

    pub async fn send(&self, destination: Destination, text: &str) -> AppResult<()> {
        let mut reconciler = self.reconciler(Arc::new(NullSurface))?;
        // Load first so the snapshot write keeps earlier history.
        reconciler.load_local();

        if !reconciler.send_message(&destination, text).await {
            return Err(format!("message to {} was not sent", destination.key()).into());
        }
        println!("Sent to {}", destination.key());
        Ok(())
    }

    pub async fn notifications(&self, mark_read: Option<&EntityId>) -> AppResult<()> {
        let mut reconciler = self.reconciler(Arc::new(NullSurface))?;
        if !reconciler.fetch_notifications().await {
            return Err("could not fetch notifications".into());
        }

        if let Some(id) = mark_read {
            if reconciler.mark_notification_read(id).await {
                println!("Marked {id} read");
            } else {
                println!("Could not mark {id} read");
            }
        }

        terminal::print_notifications(reconciler.notifications());
        Ok(())
    }

    fn reconciler(&self, surface: Arc<dyn RenderSurface>) -> AppResult<Reconciler> {
        let api = HttpChatApi::new(
            &self.config.api_base_url,
            self.config.request_timeout(),
            self.config.auth_token.clone(),
        )?;

        Ok(Reconciler::new(
            EntityId::Int(self.config.user_id),
            Arc::new(api),
            SnapshotStore::new(self.store()?),
            surface,
        ))
    }

    fn store(&self) -> AppResult<Arc<dyn KeyValueStore>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryStore::new()));
        }
        self.paths.ensure_dirs()?;
        Ok(Arc::new(FileStore::open(self.paths.storage_dir())?))
    }
}
