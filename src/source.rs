//! The OS event source capability.
//!
//! The core never talks to a concrete hook API. A source installs the
//! keyboard/mouse subscriptions on the worker thread, pumps OS events into
//! the [`Dispatcher`] until asked to stop, and tears the subscriptions down
//! again. [`WindowsHookSource`](crate::winapi_utils::WindowsHookSource) is the
//! production implementation.

use crate::dispatcher::Dispatcher;
use std::fmt;
use std::sync::Arc;

/// Errors raised while installing a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The OS refused to install a hook.
    Install {
        hook_type: &'static str,
        message: String,
    },
    /// The worker's event queue could not be prepared.
    MessageQueue(String),
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::Install { hook_type, message } => {
                write!(f, "Failed to install {} hook: {}", hook_type, message)
            }
            HookError::MessageQueue(e) => write!(f, "Message queue error: {}", e),
        }
    }
}

impl std::error::Error for HookError {}

/// A global keyboard and mouse event source.
///
/// `subscribe`, `pump_until_stopped` and `unsubscribe` are always called on
/// the dedicated worker thread, in that order. `request_stop` may be called
/// from any thread and must make `pump_until_stopped` return.
pub trait EventSource: Send + Sync + 'static {
    /// Live subscription; dropping or unsubscribing it releases the hooks.
    type Subscription;

    /// Installs the subscriptions, routing every notification through
    /// `dispatcher`. Must deliver events only on the calling thread.
    fn subscribe(&self, dispatcher: Arc<Dispatcher>) -> Result<Self::Subscription, HookError>;

    /// Releases the subscriptions.
    fn unsubscribe(&self, subscription: Self::Subscription) {
        drop(subscription);
    }

    /// Blocks, delivering events, until `request_stop` is called.
    fn pump_until_stopped(&self);

    /// Asks the pump to return. A request made before the pump starts is not lost.
    fn request_stop(&self);
}

#[cfg(test)]
pub(crate) mod testing {
    //! A channel-driven source that runs the real worker thread without OS hooks.

    use super::*;
    use crate::event::Modifiers;
    use crate::normalize::{RawKeyEvent, RawMouseEvent};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};
    use std::time::Duration;

    const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

    enum Command {
        Key(RawKeyEvent, Modifiers, Sender<bool>),
        Mouse(RawMouseEvent, Sender<bool>),
        Stop,
    }

    pub(crate) struct ChannelSubscription;

    #[derive(Default)]
    pub(crate) struct SourceStats {
        pub subscribes: AtomicUsize,
        pub unsubscribes: AtomicUsize,
    }

    pub(crate) struct ChannelSource {
        sender: Mutex<Sender<Command>>,
        receiver: Mutex<Receiver<Command>>,
        active: Mutex<Option<Arc<Dispatcher>>>,
        fail_subscribe: AtomicBool,
        worker: Mutex<Option<ThreadId>>,
        pub stats: SourceStats,
    }

    impl ChannelSource {
        pub fn new() -> Self {
            let (sender, receiver) = mpsc::channel();
            Self {
                sender: Mutex::new(sender),
                receiver: Mutex::new(receiver),
                active: Mutex::new(None),
                fail_subscribe: AtomicBool::new(false),
                worker: Mutex::new(None),
                stats: SourceStats::default(),
            }
        }

        /// Makes every following `subscribe` fail.
        pub fn fail_subscribe(&self, fail: bool) {
            self.fail_subscribe.store(fail, Ordering::SeqCst);
        }

        pub fn worker_thread(&self) -> Option<ThreadId> {
            *self.worker.lock().unwrap()
        }

        pub fn is_subscribed(&self) -> bool {
            self.active.lock().unwrap().is_some()
        }

        /// Delivers a key notification on the worker and waits for the
        /// consumed decision. `None` if no worker is pumping.
        pub fn inject_key(&self, raw: RawKeyEvent, modifiers: Modifiers) -> Option<bool> {
            let (reply, answer) = mpsc::channel();
            self.send(Command::Key(raw, modifiers, reply));
            answer.recv_timeout(REPLY_TIMEOUT).ok()
        }

        pub fn inject_mouse(&self, raw: RawMouseEvent) -> Option<bool> {
            let (reply, answer) = mpsc::channel();
            self.send(Command::Mouse(raw, reply));
            answer.recv_timeout(REPLY_TIMEOUT).ok()
        }

        fn send(&self, command: Command) {
            let _ = self.sender.lock().unwrap().send(command);
        }

        fn dispatcher(&self) -> Option<Arc<Dispatcher>> {
            self.active.lock().unwrap().clone()
        }
    }

    impl EventSource for ChannelSource {
        type Subscription = ChannelSubscription;

        fn subscribe(&self, dispatcher: Arc<Dispatcher>) -> Result<ChannelSubscription, HookError> {
            if self.fail_subscribe.load(Ordering::SeqCst) {
                return Err(HookError::Install {
                    hook_type: "channel",
                    message: "subscription refused".to_string(),
                });
            }
            *self.worker.lock().unwrap() = Some(thread::current().id());
            *self.active.lock().unwrap() = Some(dispatcher);
            self.stats.subscribes.fetch_add(1, Ordering::SeqCst);
            Ok(ChannelSubscription)
        }

        fn unsubscribe(&self, _subscription: ChannelSubscription) {
            *self.active.lock().unwrap() = None;
            self.stats.unsubscribes.fetch_add(1, Ordering::SeqCst);
        }

        fn pump_until_stopped(&self) {
            let receiver = self.receiver.lock().unwrap();
            while let Ok(command) = receiver.recv() {
                match command {
                    Command::Key(raw, modifiers, reply) => {
                        let consumed = self
                            .dispatcher()
                            .is_some_and(|d| d.on_raw_key(&raw, &modifiers));
                        let _ = reply.send(consumed);
                    }
                    Command::Mouse(raw, reply) => {
                        let consumed = self.dispatcher().is_some_and(|d| d.on_raw_mouse(&raw));
                        let _ = reply.send(consumed);
                    }
                    Command::Stop => break,
                }
            }
        }

        fn request_stop(&self) {
            self.send(Command::Stop);
        }
    }
}
