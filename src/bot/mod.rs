//! Bot controller.
//!
//! Consumes the platform's inbound event stream, keeps the per-connection
//! [`SessionContext`], dispatches routed and moderator commands, and owns
//! the advance timer. Side effects are performed through [`ChatClient`].
//!
//! Submodules:
//! - [`advance`]: the timer-driven queue advancement workflow
//! - [`queue_commands`]: routed `!join`, `!list`, `!unmuteall`
//! - [`moderation`]: moderator-only commands

mod advance;
mod moderation;
mod queue_commands;

use crate::config::{CommunityConfig, QueueConfig};
use crate::gate::ModCommand;
use crate::platform::{ChannelId, ChatClient, ChatEvent, InboundMessage, Server};
use crate::queue::SharedQueue;
use crate::router::{CommandRouter, RoutedCommand};
use crate::session::SessionContext;
use crate::telemetry::{CommandTimer, spans};
use crate::timer::AdvanceTimer;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, warn};

/// Members named in queue status messages.
pub const UPCOMING_SHOWN: usize = 3;

/// Resolved session plus the route table built from it.
#[derive(Debug)]
pub struct ActiveSession {
    pub context: SessionContext,
    pub router: CommandRouter,
}

/// Wires queue, timer, router and gate to the chat platform.
pub struct BotController {
    client: Arc<dyn ChatClient>,
    queue: SharedQueue,
    community: CommunityConfig,
    settings: QueueConfig,
    session: RwLock<Option<Arc<ActiveSession>>>,
    timer: AdvanceTimer,
    timer_started: AtomicBool,
    timer_task: Mutex<Option<JoinHandle<()>>>,
    /// Long-running command handlers.
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl BotController {
    pub fn new(
        client: Arc<dyn ChatClient>,
        queue: SharedQueue,
        community: CommunityConfig,
        settings: QueueConfig,
    ) -> Arc<Self> {
        let timer = AdvanceTimer::new(settings.advance_interval());
        Arc::new(Self {
            client,
            queue,
            community,
            settings,
            session: RwLock::new(None),
            timer,
            timer_started: AtomicBool::new(false),
            timer_task: Mutex::new(None),
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    pub fn timer(&self) -> &AdvanceTimer {
        &self.timer
    }

    /// Cancelled once the session is ending.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn session(&self) -> Option<Arc<ActiveSession>> {
        self.session.read().clone()
    }

    /// Consume inbound events until the stream closes or the bot quits,
    /// then wait for background work to wind down.
    pub async fn run(self: &Arc<Self>, mut events: mpsc::Receiver<ChatEvent>) {
        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle_event(event).await;
        }

        self.shutdown.cancel();
        let timer = self.timer_task.lock().take();
        if let Some(handle) = timer
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Advance timer task ended abnormally");
        }
        self.wait_background().await;
        info!("Bot controller stopped");
    }

    pub async fn handle_event(self: &Arc<Self>, event: ChatEvent) {
        match event {
            ChatEvent::Ready { servers } => self.on_ready(servers).await,
            ChatEvent::Message(msg) => {
                let span = spans::message(&msg.channel_id, &msg.author.id);
                self.on_message(msg).instrument(span).await;
            }
        }
    }

    /// Wait for spawned command handlers to finish.
    pub async fn wait_background(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// End the session: stop background work and disconnect.
    pub async fn quit(&self) {
        info!("Quitting");
        self.shutdown.cancel();
        self.client.shutdown().await;
    }

    async fn on_ready(self: &Arc<Self>, servers: Vec<Server>) {
        match SessionContext::resolve(self.client.as_ref(), &servers, &self.community).await {
            Ok(context) => {
                let router = CommandRouter::for_session(&context, self.community.delete_commands);
                *self.session.write() = Some(Arc::new(ActiveSession { context, router }));
                self.start_timer();
            }
            Err(e) => {
                *self.session.write() = None;
                error!(
                    error = %e,
                    code = e.error_code(),
                    "Failed to resolve session, ignoring commands until the next ready"
                );
            }
        }
    }

    fn start_timer(self: &Arc<Self>) {
        if self.timer_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let timer = self.timer.clone();
        let target = Arc::clone(self);
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move { timer.run(target, shutdown).await });
        *self.timer_task.lock() = Some(handle);
    }

    async fn on_message(self: &Arc<Self>, msg: InboundMessage) {
        let Some(session) = self.session() else {
            debug!("Message received before the session was resolved");
            return;
        };

        if let Some(found) = session.router.resolve_message(&msg) {
            let _timer = CommandTimer::new(found.command.name());
            let outcome = self
                .dispatch_routed(&session, &msg, found.command)
                .instrument(spans::command(found.command.name()))
                .await;
            match outcome {
                Ok(()) if found.delete_after => {
                    if let Err(e) = self.client.delete_message(&msg.channel_id, &msg.id).await {
                        warn!(error = %e, code = e.error_code(), "Failed to delete command message");
                    }
                }
                Ok(()) => {}
                Err(e) => warn!(
                    command = found.command.name(),
                    error = %e,
                    code = e.error_code(),
                    "Routed command failed"
                ),
            }
            return;
        }

        if !session
            .context
            .moderators
            .is_authorized(msg.author.roles.as_deref())
        {
            return;
        }

        info!("{}: {}", msg.author.name, msg.text);
        let Some(command) = ModCommand::parse(&msg.text) else {
            return;
        };
        let _timer = CommandTimer::new(command.name());
        if let Err(e) = self
            .dispatch_moderator(&session, &msg, command)
            .instrument(spans::command(command.name()))
            .await
        {
            warn!(
                command = command.name(),
                error = %e,
                code = e.error_code(),
                "Moderator command failed"
            );
        }
    }

    async fn dispatch_routed(
        self: &Arc<Self>,
        session: &Arc<ActiveSession>,
        msg: &InboundMessage,
        command: RoutedCommand,
    ) -> Result<(), crate::error::PlatformError> {
        match command {
            RoutedCommand::Join => self.handle_join(&session.context, msg).await,
            RoutedCommand::List => self.handle_list(&session.context).await,
            RoutedCommand::UnmuteAll => {
                self.spawn_unmute_all(Arc::clone(session), msg.channel_id.clone());
                Ok(())
            }
        }
    }

    /// Post `text`, logging instead of failing.
    async fn announce(&self, channel: &ChannelId, text: &str) {
        if let Err(e) = self.client.send_message(channel, text).await {
            warn!(channel = %channel, error = %e, code = e.error_code(), "Failed to send message");
        }
    }
}
