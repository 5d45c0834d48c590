//! The shell root object and its event loop.

use crate::annotations::AnnotationBook;
use crate::binding::LiveFacade;
use crate::bridge::KeyManagerBridge;
use crate::error::{ShellError, ShellResult};
use crate::scheduler::{NodeEvent, RefreshScheduler, TickOutcome};
use crate::view::{LogLevel, ViewSink, ViewUpdate};
use aleth_config::{SettingsBlob, SettingsFlags, SettingsStore, ShellConfig};
use aleth_core::{NodeHandles, WatchId, WatchKind};
use aleth_extensions::{
    FacadeBinding, NodeFacade, Plugin, PluginCatalog, PluginContext, PluginHandle, PluginRegistry,
};
use aleth_wallets::{CredentialPrompt, KeyManager, ScryptParameters, SharedKeyManager};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// State shared between the shell and its live facade.
pub(crate) struct ShellCore {
    pub(crate) node: RwLock<Option<NodeHandles>>,
    pub(crate) keys: SharedKeyManager,
    pub(crate) settings: Mutex<SettingsBlob>,
    pub(crate) store: SettingsStore,
    pub(crate) prompt: Arc<dyn CredentialPrompt>,
    pub(crate) annotations: Arc<AnnotationBook>,
    pub(crate) binding: Arc<FacadeBinding>,
    pub(crate) scheduler: Arc<RefreshScheduler>,
    pub(crate) view: Arc<dyn ViewSink>,
}

/// Where the shell keeps its files.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub settings_path: PathBuf,
    /// `None` keeps keys in memory only.
    pub keys_path: Option<PathBuf>,
    pub plugin_dir: PathBuf,
    pub scrypt: ScryptParameters,
    /// Applied when no settings file exists yet.
    pub peer_count_target: u32,
}

impl ShellOptions {
    /// Options for the data directory and key store named by `config`.
    pub fn from_config(config: &ShellConfig) -> ShellResult<Self> {
        Ok(Self {
            settings_path: config.settings_path(),
            keys_path: Some(config.keys_path()),
            plugin_dir: config.plugin_dir(),
            scrypt: ScryptParameters::from_config(&config.key_store)?,
            peer_count_target: config.peer_count_target,
        })
    }

    /// Settings and plugin data under `dir`, keys in memory.
    pub fn ephemeral(dir: impl Into<PathBuf>, scrypt: ScryptParameters) -> Self {
        let dir = dir.into();
        Self {
            settings_path: dir.join(aleth_config::DEFAULT_SETTINGS_FILE),
            keys_path: None,
            plugin_dir: dir.join("plugins"),
            scrypt,
            peer_count_target: aleth_config::DEFAULT_PEER_COUNT_TARGET,
        }
    }
}

/// Work sent to the shell thread by the front-end.
pub enum ShellCommand {
    Run(Box<dyn FnOnce(&mut Shell) + Send>),
    Quit,
}

impl ShellCommand {
    /// Wraps `f` as work for the shell thread.
    pub fn run<F>(f: F) -> Self
    where
        F: FnOnce(&mut Shell) + Send + 'static,
    {
        ShellCommand::Run(Box::new(f))
    }
}

impl std::fmt::Debug for ShellCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellCommand::Run(_) => f.write_str("ShellCommand::Run"),
            ShellCommand::Quit => f.write_str("ShellCommand::Quit"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Toggles {
    pub(crate) force_mining: bool,
    pub(crate) turbo_mining: bool,
    pub(crate) confirm: bool,
    pub(crate) paranoia: bool,
}

/// The control shell.
pub struct Shell {
    pub(crate) core: Arc<ShellCore>,
    registry: PluginRegistry,
    catalog: PluginCatalog,
    bridge: KeyManagerBridge,
    events_tx: UnboundedSender<NodeEvent>,
    events_rx: EventSlot,
    watches: Vec<WatchId>,
    pub(crate) toggles: Toggles,
}

type EventSlot = Arc<Mutex<Option<UnboundedReceiver<NodeEvent>>>>;

/// The event receiver while [`Shell::run`] owns it. Dropping the lease puts the
/// receiver back, including when the run future is dropped mid-await.
struct EventLease {
    slot: EventSlot,
    events: Option<UnboundedReceiver<NodeEvent>>,
}

impl EventLease {
    fn take(slot: &EventSlot) -> Option<Self> {
        let events = slot.lock().take()?;
        Some(Self {
            slot: slot.clone(),
            events: Some(events),
        })
    }

    async fn recv(&mut self) -> Option<NodeEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }
}

impl Drop for EventLease {
    fn drop(&mut self) {
        if let Some(events) = self.events.take() {
            *self.slot.lock() = Some(events);
        }
    }
}

impl Shell {
    /// Opens the key store and settings and builds an unbound shell.
    pub fn new(
        options: ShellOptions,
        prompt: Arc<dyn CredentialPrompt>,
        view: Arc<dyn ViewSink>,
    ) -> ShellResult<Self> {
        let keys = match &options.keys_path {
            Some(path) => KeyManager::open(path, options.scrypt)?,
            None => KeyManager::in_memory(options.scrypt),
        }
        .into_shared();

        let store = SettingsStore::new(&options.settings_path);
        let fresh = !store.path().exists();
        let mut settings = store.read(SettingsFlags::EVERYTHING)?;
        if fresh {
            settings.peer_count_target = options.peer_count_target;
        }

        let binding = Arc::new(FacadeBinding::unbound());
        let scheduler = Arc::new(RefreshScheduler::new(binding.clone(), view.clone()));
        let core = Arc::new(ShellCore {
            node: RwLock::new(None),
            keys: keys.clone(),
            settings: Mutex::new(settings),
            store,
            prompt,
            annotations: Arc::new(AnnotationBook::new()),
            binding: binding.clone(),
            scheduler,
            view,
        });

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        info!(
            settings = %options.settings_path.display(),
            accounts = keys.lock().len(),
            "shell created"
        );

        Ok(Self {
            core,
            registry: PluginRegistry::new(binding.clone(), options.plugin_dir),
            catalog: PluginCatalog::new(),
            bridge: KeyManagerBridge::new(keys, binding),
            events_tx,
            events_rx: Arc::new(Mutex::new(Some(events_rx))),
            watches: Vec::new(),
            toggles: Toggles::default(),
        })
    }

    /// Binds the shell to a running node and runs an initial refresh.
    pub fn attach_node(&mut self, handles: NodeHandles) -> ShellResult<()> {
        if self.is_attached() {
            self.detach_node();
        }

        let settings = self.settings();
        let chain = handles.chain.clone();
        chain.set_vm(settings.vm);
        if let Some(beneficiary) = settings.beneficiary {
            chain.set_beneficiary(beneficiary);
        }
        if settings.is_private_chain() {
            chain.set_private_chain(Some(&settings.private_chain_name))?;
        }
        handles.web3.set_ideal_peer_count(settings.peer_count_target);

        *self.core.node.write() = Some(handles);

        for (kind, event) in [
            (WatchKind::NewBlock, NodeEvent::NewBlock),
            (WatchKind::PendingChanged, NodeEvent::PendingChanged),
        ] {
            let events = self.events_tx.clone();
            let id = chain.install_watch(
                kind,
                Box::new(move || {
                    let _ = events.send(event);
                }),
            );
            self.watches.push(id);
        }

        let live: Arc<dyn NodeFacade> = Arc::new(LiveFacade::new(Arc::downgrade(&self.core)));
        self.core.binding.bind(live);
        self.core.scheduler.reset();
        info!("node attached");
        self.tick();
        Ok(())
    }

    /// Unbinds the node. Returns `false` when none was attached.
    pub fn detach_node(&mut self) -> bool {
        let Some(handles) = self.core.node.write().take() else {
            return false;
        };
        for id in self.watches.drain(..) {
            handles.chain.uninstall_watch(id);
        }
        if handles.web3.is_networking() {
            self.core.settings.lock().network_config = handles.web3.save_network();
        }
        self.core.binding.unbind();
        self.core.scheduler.reset();
        info!("node detached");
        true
    }

    /// Whether a node is attached.
    pub fn is_attached(&self) -> bool {
        self.core.node.read().is_some()
    }

    /// Runs a refresh cycle and, when it completes, polls every plugin.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.core.scheduler.tick();
        if outcome == TickOutcome::Completed {
            self.registry.poll_all();
        }
        outcome
    }

    /// Applies queued node notifications. Returns how many were received.
    pub fn pump_events(&mut self) -> usize {
        let mut received = 0;
        if let Some(events) = self.events_rx.lock().as_mut() {
            while let Ok(event) = events.try_recv() {
                self.core.scheduler.enqueue(event);
                received += 1;
            }
        }
        if received > 0 {
            self.core.scheduler.run_pending();
        }
        received
    }

    /// Queues the stages `event` affects and runs them.
    pub fn handle_node_event(&mut self, event: NodeEvent) {
        debug!(?event, "node event");
        self.core.scheduler.enqueue(event);
        self.core.scheduler.run_pending();
    }

    /// Drives the shell until `Quit` arrives or the command channel closes.
    ///
    /// Refresh ticks fire every `period`; ticks missed while busy are skipped.
    pub async fn run(
        &mut self,
        period: Duration,
        mut commands: UnboundedReceiver<ShellCommand>,
    ) -> ShellResult<()> {
        let mut events = EventLease::take(&self.events_rx)
            .ok_or_else(|| ShellError::InvalidInput("event loop already running".into()))?;

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis() as u64, "shell event loop started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                Some(event) = events.recv() => {
                    self.handle_node_event(event);
                }
                command = commands.recv() => match command {
                    Some(ShellCommand::Run(work)) => work(self),
                    Some(ShellCommand::Quit) | None => break,
                },
            }
        }

        drop(events);
        info!("shell event loop stopped");
        Ok(())
    }

    /// Unloads plugins, detaches the node and writes the settings.
    pub fn shutdown(&mut self) -> ShellResult<()> {
        self.registry.unload_all();
        self.detach_node();
        self.persist(SettingsFlags::EVERYTHING)?;
        info!("shell shut down");
        Ok(())
    }

    // Plugins

    /// Makes `factory` available under `name` for [`Shell::load_plugin`].
    pub fn register_plugin<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&PluginContext) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.catalog.register(name, factory);
    }

    /// Loads the catalog entry registered under `name`.
    pub fn load_plugin(&mut self, name: &str) -> ShellResult<PluginHandle> {
        let handle = self.registry.load_from_catalog(&self.catalog, name)?;
        self.publish_plugins();
        Ok(handle)
    }

    /// Loads a plugin that is not in the catalog.
    pub fn load_plugin_with<F>(&mut self, name: &str, factory: F) -> ShellResult<PluginHandle>
    where
        F: FnOnce(&PluginContext) -> Box<dyn Plugin>,
    {
        let handle = self.registry.load(name, factory)?;
        self.publish_plugins();
        Ok(handle)
    }

    /// Finalizes and drops the plugin loaded under `name`.
    pub fn unload_plugin(&mut self, name: &str) -> ShellResult<()> {
        self.registry.unload(name)?;
        self.publish_plugins();
        Ok(())
    }

    /// Loads the plugin if absent, unloads it if present. Returns whether it is now loaded.
    pub fn toggle_plugin(&mut self, name: &str) -> ShellResult<bool> {
        if self.registry.contains(name) {
            self.unload_plugin(name)?;
            Ok(false)
        } else {
            self.load_plugin(name)?;
            Ok(true)
        }
    }

    /// Names of loaded plugins, in load order.
    pub fn plugins(&self) -> Vec<String> {
        self.registry.names()
    }

    /// The plugin registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Mutable access to the plugin registry.
    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    /// Plugins available by name.
    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    fn publish_plugins(&self) {
        self.core.view.publish(ViewUpdate::Plugins(self.registry.names()));
    }

    // Accessors

    /// The facade binding handed to plugins and the scheduler.
    pub fn facade(&self) -> Arc<dyn NodeFacade> {
        self.core.binding.clone()
    }

    /// The slot tracking whether the facade is bound.
    pub fn binding(&self) -> &Arc<FacadeBinding> {
        &self.core.binding
    }

    /// Key management on behalf of the user.
    pub fn bridge(&self) -> &KeyManagerBridge {
        &self.bridge
    }

    /// The shared key store.
    pub fn keys(&self) -> &SharedKeyManager {
        &self.core.keys
    }

    /// The refresh scheduler driving the view.
    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.core.scheduler
    }

    /// Contract names used to annotate calls.
    pub fn annotations(&self) -> &Arc<AnnotationBook> {
        &self.core.annotations
    }

    /// The store the settings are written to.
    pub fn settings_store(&self) -> &SettingsStore {
        &self.core.store
    }

    /// Sender for node notifications, for nodes that report changes outside watches.
    pub fn event_sender(&self) -> UnboundedSender<NodeEvent> {
        self.events_tx.clone()
    }

    // Settings

    /// A copy of the in-memory settings.
    pub fn settings(&self) -> SettingsBlob {
        self.core.settings.lock().clone()
    }

    /// Changes the in-memory settings and writes them in full.
    pub fn update_settings<F>(&self, change: F)
    where
        F: FnOnce(&mut SettingsBlob),
    {
        change(&mut self.core.settings.lock());
        self.core.binding.on_settings_changed();
        if !self.is_attached() {
            // The unbound facade does not persist.
            if let Err(e) = self.persist(SettingsFlags::EVERYTHING) {
                warn!(error = %e, "failed to write settings");
            }
        }
    }

    /// Records the presentation layer's window geometry. Only geometry is written.
    pub fn note_geometry(&self, geometry: Vec<u8>) -> ShellResult<()> {
        self.core.settings.lock().window_geometry = geometry;
        self.persist(SettingsFlags::ONLY_GEOMETRY)
    }

    pub(crate) fn persist(&self, flags: SettingsFlags) -> ShellResult<()> {
        let blob = self.settings();
        self.core.store.write(&blob, flags)?;
        Ok(())
    }

    // Log channels

    /// Publishes a note on the log channel.
    pub fn note(&self, entry: impl Into<String>) {
        let entry = entry.into();
        info!(target: "aleth::note", "{}", entry);
        self.log(LogLevel::Note, entry);
    }

    /// Publishes a debug entry on the log channel.
    pub fn debug(&self, entry: impl Into<String>) {
        let entry = entry.into();
        debug!(target: "aleth::note", "{}", entry);
        self.log(LogLevel::Debug, entry);
    }

    /// Publishes a warning on the log channel.
    pub fn warn(&self, entry: impl Into<String>) {
        let entry = entry.into();
        warn!(target: "aleth::note", "{}", entry);
        self.log(LogLevel::Warn, entry);
    }

    fn log(&self, level: LogLevel, entry: String) {
        self.core.view.publish(ViewUpdate::Log { level, entry });
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.registry.unload_all();
        if let Some(handles) = self.core.node.read().as_ref() {
            for id in self.watches.drain(..) {
                handles.chain.uninstall_watch(id);
            }
        }
        self.core.binding.unbind();
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("attached", &self.is_attached())
            .field("plugins", &self.registry.names())
            .field("toggles", &self.toggles)
            .finish_non_exhaustive()
    }
}
