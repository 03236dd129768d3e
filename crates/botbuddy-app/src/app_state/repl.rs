//! Line-oriented terminal front end.
//!
//! Input lines become commands or messages; everything shown about the
//! conversation is rendered from the active session's event stream.

use std::io::Write;
use std::sync::Arc;

use botbuddy_ai::SessionEvent;
use botbuddy_common::{BotBuddyError, ChatId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::commands::{parse_command, Command, HELP};
use super::render::{render_activation, render_chats, render_event, render_status};
use super::roster::{ActiveSession, ChatRoster};

/// The active chat as the REPL sees it: a send queue drained in order by a
/// worker task, and a subscription to the session's events.
struct Conversation {
    session: ActiveSession,
    queue: mpsc::UnboundedSender<String>,
    worker: JoinHandle<()>,
    events: broadcast::Receiver<SessionEvent>,
}

impl Conversation {
    fn start(session: ActiveSession) -> Self {
        let (queue, mut rx) = mpsc::unbounded_channel::<String>();
        let events = session.subscribe();
        let worker_session = Arc::clone(&session);
        let worker = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                // The outcome reaches the transcript and the event stream.
                if let Err(e) = worker_session.submit(&text).await {
                    debug!(error = %e, "submit finished with an error");
                }
            }
        });
        Self {
            session,
            queue,
            worker,
            events,
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

pub struct Repl<W: Write> {
    roster: ChatRoster,
    out: W,
    current: Option<Conversation>,
}

impl<W: Write> Repl<W> {
    pub fn new(roster: ChatRoster, out: W) -> Self {
        Self {
            roster,
            out,
            current: None,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until `/quit` or end of input. On end of input, queued messages
    /// are still answered before returning.
    pub async fn run<R>(&mut self, input: R, start: ChatId) -> Result<(), BotBuddyError>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(self.out, "Bot Buddy AI  (type /help for commands)")?;
        self.open(start).await?;

        let mut lines = input.lines();
        loop {
            let Some(conversation) = self.current.as_mut() else {
                break;
            };
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        self.finish().await?;
                        break;
                    };
                    if let Flow::Quit = self.handle_line(&line).await? {
                        self.abort();
                        break;
                    }
                }
                event = conversation.events.recv() => {
                    self.on_event(event)?;
                }
            }
        }
        self.roster.deactivate();
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow, BotBuddyError> {
        match parse_command(line) {
            Command::Say(text) => {
                if text.trim().is_empty() {
                    return Ok(Flow::Continue);
                }
                if let Some(conversation) = self.current.as_ref() {
                    if conversation.queue.send(text).is_err() {
                        warn!("send queue closed; message dropped");
                    }
                }
            }
            Command::Chats => {
                let listing = render_chats(self.roster.chats(), self.roster.active_id());
                writeln!(self.out, "{listing}")?;
            }
            Command::Open(id) => self.open(id).await?,
            Command::Retry => {
                if let Some(id) = self.roster.active_id() {
                    self.open(id).await?;
                }
            }
            Command::Clear => {
                if let Some(conversation) = self.current.as_ref() {
                    if let Err(e) = conversation.session.reset() {
                        writeln!(self.out, "error: {e}")?;
                    }
                }
            }
            Command::Status => {
                if let Some(conversation) = self.current.as_ref() {
                    let session = &conversation.session;
                    if let Some(chat) = self.roster.find(session.chat()) {
                        let status = render_status(chat, &session.snapshot(), session.usage());
                        writeln!(self.out, "{status}")?;
                    }
                }
            }
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Invalid(msg) => writeln!(self.out, "error: {msg}")?,
        }
        Ok(Flow::Continue)
    }

    /// Activate `id` and attach to its session. Unknown ids are reported
    /// and leave the current chat open.
    async fn open(&mut self, id: ChatId) -> Result<(), BotBuddyError> {
        let session = match self.roster.activate(id).await {
            Ok(session) => session,
            Err(e) => {
                writeln!(self.out, "error: {e}")?;
                return Ok(());
            }
        };

        let same = self
            .current
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(&c.session, &session));
        if !same {
            self.abort();
            self.current = Some(Conversation::start(Arc::clone(&session)));
        }

        if let Some(chat) = self.roster.find(id) {
            let summary = render_activation(chat, &session.snapshot());
            writeln!(self.out, "{summary}")?;
        }
        Ok(())
    }

    fn on_event(
        &mut self,
        event: Result<SessionEvent, broadcast::error::RecvError>,
    ) -> Result<(), BotBuddyError> {
        match event {
            Ok(event) => {
                if let Some(line) = render_event(&event) {
                    writeln!(self.out, "{line}")?;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "renderer fell behind the session events");
            }
            Err(broadcast::error::RecvError::Closed) => {
                // The session is gone; nothing more will arrive on this receiver.
                self.current = None;
            }
        }
        Ok(())
    }

    /// Stop accepting input, let the worker answer what is queued, then
    /// flush the remaining events.
    async fn finish(&mut self) -> Result<(), BotBuddyError> {
        let Some(conversation) = self.current.take() else {
            return Ok(());
        };
        let Conversation {
            session,
            queue,
            mut worker,
            mut events,
        } = conversation;
        drop(queue);

        loop {
            tokio::select! {
                _ = &mut worker => break,
                event = events.recv() => self.on_event(event)?,
            }
        }
        while let Ok(event) = events.try_recv() {
            self.on_event(Ok(event))?;
        }
        drop(session);
        Ok(())
    }

    /// Cancel the active conversation's worker, abandoning any reply in flight.
    fn abort(&mut self) {
        if let Some(conversation) = self.current.take() {
            conversation.worker.abort();
        }
    }
}
