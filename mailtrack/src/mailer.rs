//! The mail facade an application sends through.
//!
//! Plugins registered with a [`Mailer`] are told about every message before
//! it reaches the transport ([`Event::BeforeSend`]) and again once the
//! transport has accepted it ([`Event::SendPerformed`]).

use std::{fmt, sync::Arc};

use mailtrack_common::transport;

use crate::{error::TransportError, message::OutgoingMessage, transport::Transport};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Event {
    /// Triggered before the message is handed to the transport
    BeforeSend,
    /// Triggered after the transport accepted the message
    SendPerformed,
}

/// What a plugin is handed for each [`Event`].
#[derive(Debug, Clone, Copy)]
pub struct SendEvent<'a> {
    event: Event,
    message: &'a OutgoingMessage,
}

impl<'a> SendEvent<'a> {
    #[inline]
    pub const fn event(&self) -> Event {
        self.event
    }

    #[inline]
    pub const fn message(&self) -> &'a OutgoingMessage {
        self.message
    }
}

/// A plugin interested in outgoing mail.
pub trait EventListener: Send + Sync {
    fn before_send(&self, event: &SendEvent<'_>);

    fn send_performed(&self, _event: &SendEvent<'_>) {}

    /// A plugin reporting `false` has nothing left to do and is dropped the
    /// next time a plugin is registered.
    fn is_attached(&self) -> bool {
        true
    }
}

pub struct Mailer {
    transport: Box<dyn Transport>,
    plugins: Vec<Arc<dyn EventListener>>,
}

impl fmt::Debug for Mailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailer")
            .field("plugins", &self.plugins.len())
            .finish_non_exhaustive()
    }
}

impl Mailer {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            plugins: Vec::new(),
        }
    }

    /// Plugins are notified in registration order.
    pub fn register_plugin(&mut self, plugin: Arc<dyn EventListener>) {
        let before = self.plugins.len();
        self.plugins.retain(|plugin| plugin.is_attached());
        if self.plugins.len() < before {
            transport!("Dropped {} detached plugins", before - self.plugins.len());
        }

        transport!("Registered plugin #{}", self.plugins.len() + 1);
        self.plugins.push(plugin);
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    fn emit(&self, event: Event, message: &OutgoingMessage) {
        let send_event = SendEvent { event, message };

        for plugin in &self.plugins {
            match event {
                Event::BeforeSend => plugin.before_send(&send_event),
                Event::SendPerformed => plugin.send_performed(&send_event),
            }
        }
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// Whatever the transport reports. Plugins have already seen the message
    /// by then, but [`Event::SendPerformed`] is not emitted.
    pub fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.emit(Event::BeforeSend, message);

        if let Err(err) = self.transport.send(message) {
            transport!(level = WARN, "Transport failed: {err}");
            return Err(err);
        }

        self.emit(Event::SendPerformed, message);
        Ok(())
    }
}
