//! Priority-ordered publish/subscribe dispatch of [`Message`]s.
//!
//! Functors are registered per message type with a [`Priority`].
//! [`MessagePump::emit_message`] calls them synchronously,
//! highest priority first and in registration order among equal priorities.
//!
//! Dispatch is two-phase.
//! The registry is first walked once to capture the functors to call,
//! erasing tombstoned entries and single-shot entries along the way.
//! The captured functors are then called with the registry released,
//! so a functor may register or unregister functors (even for the same type)
//! without affecting the ongoing dispatch.
//!
//! The pump itself is single-threaded.
//! Other threads feed it through a [`MessageQueue`] handle obtained from [`MessagePump::queue`],
//! and the owning thread delivers queued messages with [`MessagePump::emit_queued_messages`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::{fmt, mem};

use crate::message::{Message, MessageType};
use crate::sid::Interner;
use crate::tracer::{self, DropReason, Tracer};

mod queue;
pub use queue::MessageQueue;


/// Scheduled times at or below this value are delivered on the next flush regardless of `now`.
pub const DEFAULT_IMMEDIATE_THRESHOLD: f64 = 0.001;

/// The dispatch priority of a registered functor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Lowest  = 0,
    #[default]
    Default = 1,
    Higher  = 2,
    Highest = 3,
}

/// Options for [`MessagePump::register_for_messages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    /// Functors of higher priority are called first.
    pub priority:    Priority,
    /// The functor is unregistered as soon as it is captured for dispatch.
    pub single_shot: bool,
}

impl Options {
    /// Options with the given priority.
    pub fn priority(priority: Priority) -> Self { Self { priority, single_shot: false } }

    /// Makes the registration single-shot.
    pub fn single_shot(mut self) -> Self {
        self.single_shot = true;
        self
    }
}

impl From<Priority> for Options {
    fn from(priority: Priority) -> Self { Self::priority(priority) }
}

/// A comparable reference to a message handler.
///
/// Clones of a functor compare equal to each other,
/// while two functors created separately are always different,
/// even when built from the same closure.
#[derive(Clone)]
pub struct MessageFunctor(Rc<dyn Fn(&Message)>);

impl MessageFunctor {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&Message) + 'static) -> Self { Self(Rc::new(f)) }

    /// Calls the handler.
    pub fn call(&self, message: &Message) { (self.0)(message) }

    fn addr(&self) -> *const () { Rc::as_ptr(&self.0) as *const () }
}

impl PartialEq for MessageFunctor {
    fn eq(&self, other: &Self) -> bool { self.addr() == other.addr() }
}

impl Eq for MessageFunctor {}

impl fmt::Debug for MessageFunctor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MessageFunctor({:p})", self.addr())
    }
}

struct Entry {
    functor:      MessageFunctor,
    options:      Options,
    /// Tombstone. The entry is erased the next time its message type is dispatched.
    unregistered: bool,
    debug_name:   Rc<str>,
}

/// Settings of a [`MessagePump`].
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Messages enqueued with a scheduled time at or below this value skip the future queue.
    pub immediate_threshold: f64,
}

impl Default for Config {
    fn default() -> Self { Self { immediate_threshold: DEFAULT_IMMEDIATE_THRESHOLD } }
}

/// Dispatches messages to registered functors.
pub struct MessagePump {
    interner: Arc<Interner>,
    registry: RefCell<HashMap<MessageType, Vec<Entry>>>,
    queue:    Arc<MessageQueue>,
    /// Future messages moved out of `queue`, in arrival order.
    future:   RefCell<Vec<(f64, Message)>>,
    tracer:   Box<dyn Tracer>,
}

impl MessagePump {
    /// Creates a pump with default settings.
    pub fn new(interner: Arc<Interner>) -> Self {
        Self::with_config(interner, Config::default(), tracer::Noop)
    }

    /// Creates a pump with custom settings and a tracer.
    pub fn with_config(
        interner: Arc<Interner>,
        config: Config,
        tracer: impl Tracer + 'static,
    ) -> Self {
        Self {
            interner,
            registry: RefCell::default(),
            queue: Arc::new(MessageQueue::new(config.immediate_threshold)),
            future: RefCell::default(),
            tracer: Box::new(tracer),
        }
    }

    /// The interner used to name message types in logs.
    pub fn interner(&self) -> &Arc<Interner> { &self.interner }

    /// Returns a thread-safe handle for enqueuing messages into this pump.
    pub fn queue(&self) -> Arc<MessageQueue> { Arc::clone(&self.queue) }

    /// Registers `functor` for messages of type `ty`.
    ///
    /// The functor is placed after all registrations of equal or higher priority.
    /// An empty `debug_name` is replaced by the name of the message type.
    ///
    /// Registering the same functor twice for the same type is an error;
    /// it is logged and `false` is returned.
    pub fn register_for_messages(
        &self,
        ty: MessageType,
        functor: &MessageFunctor,
        options: Options,
        debug_name: &str,
    ) -> bool {
        let debug_name: Rc<str> = if debug_name.is_empty() {
            self.interner.resolve(ty).into()
        } else {
            debug_name.into()
        };

        {
            let mut registry = self.registry.borrow_mut();
            let entries = registry.entry(ty).or_default();

            if entries.iter().any(|entry| !entry.unregistered && entry.functor == *functor) {
                log::error!(
                    "Trying to register a functor twice for same message {} ({debug_name})",
                    self.interner.resolve(ty),
                );
                return false;
            }

            let index = entries
                .iter()
                .position(|entry| entry.options.priority < options.priority)
                .unwrap_or(entries.len());
            entries.insert(
                index,
                Entry {
                    functor: functor.clone(),
                    options,
                    unregistered: false,
                    debug_name: Rc::clone(&debug_name),
                },
            );
        }

        self.tracer.register(ty, &debug_name, options);
        true
    }

    /// Wraps `f` in a new functor and registers it, returning the functor for later unregistration.
    pub fn subscribe(
        &self,
        ty: MessageType,
        options: Options,
        f: impl Fn(&Message) + 'static,
    ) -> MessageFunctor {
        let functor = MessageFunctor::new(f);
        self.register_for_messages(ty, &functor, options, "");
        functor
    }

    /// Tombstones the registration of `functor` for `ty`.
    ///
    /// Returns `false` if the functor is not registered.
    /// The functor is not called for any dispatch that starts after this returns,
    /// and it may be registered again immediately.
    pub fn unregister_for_messages(&self, ty: MessageType, functor: &MessageFunctor) -> bool {
        let mut registry = self.registry.borrow_mut();
        let Some(entries) = registry.get_mut(&ty) else { return false };

        match entries.iter_mut().find(|entry| !entry.unregistered && entry.functor == *functor) {
            Some(entry) => {
                entry.unregistered = true;
                true
            }
            None => false,
        }
    }

    /// Whether `functor` is registered for `ty` and not tombstoned.
    pub fn is_registered(&self, ty: MessageType, functor: &MessageFunctor) -> bool {
        self.registry.borrow().get(&ty).map_or(false, |entries| {
            entries.iter().any(|entry| !entry.unregistered && entry.functor == *functor)
        })
    }

    /// Whether any functor is registered for `ty`.
    pub fn has_registrants(&self, ty: MessageType) -> bool {
        self.registry
            .borrow()
            .get(&ty)
            .map_or(false, |entries| entries.iter().any(|entry| !entry.unregistered))
    }

    /// Removes all registrations.
    ///
    /// A dispatch in progress still calls the functors it has already captured.
    pub fn unregister_all(&self) { self.registry.borrow_mut().clear(); }

    /// Dispatches `message` synchronously to all functors registered for its type.
    ///
    /// Messages with an empty type are logged and dropped.
    pub fn emit_message(&self, message: &Message) {
        let ty = message.ty();
        if ty.is_none() {
            log::error!("Trying to send a message with an empty type string!");
            self.tracer.drop_message(message, DropReason::EmptyType);
            return;
        }

        let calls = self.capture(ty);
        self.tracer.emit(message, calls.len());

        for (functor, debug_name) in calls {
            let context = self.tracer.start_handler(ty, &debug_name);
            functor.call(message);
            self.tracer.end_handler(context, ty, &debug_name);
        }
    }

    /// Walks the entries of `ty` once,
    /// erasing tombstones and single-shot entries and capturing the functors to call.
    fn capture(&self, ty: MessageType) -> Vec<(MessageFunctor, Rc<str>)> {
        let mut registry = self.registry.borrow_mut();
        let Some(entries) = registry.get_mut(&ty) else { return Vec::new() };

        let mut calls = Vec::with_capacity(entries.len());
        entries.retain(|entry| {
            if entry.unregistered {
                return false;
            }

            calls.push((entry.functor.clone(), Rc::clone(&entry.debug_name)));
            !entry.options.single_shot
        });

        if entries.is_empty() {
            registry.remove(&ty);
        }

        calls
    }

    /// Queues `message` for delivery on the next [`emit_queued_messages`](Self::emit_queued_messages).
    pub fn enqueue_message(&self, message: Message) { self.queue.enqueue(message) }

    /// Queues `message` for delivery once the simulation time reaches `when`.
    pub fn enqueue_message_at(&self, message: Message, when: f64) {
        self.queue.enqueue_at(message, when)
    }

    /// Delivers queued messages.
    ///
    /// The immediate queue is drained completely,
    /// including messages enqueued by functors during the drain.
    /// Then every future message scheduled at or before `now` is delivered;
    /// the others stay pending.
    ///
    /// Returns the number of messages delivered.
    pub fn emit_queued_messages(&self, now: f64) -> usize {
        let mut delivered = 0;

        while let Some(message) = self.queue.pop_immediate() {
            self.emit_message(&message);
            delivered += 1;
        }

        let incoming = self.queue.take_future();
        self.future.borrow_mut().extend(incoming);

        // taken out so that functors may flush re-entrantly
        let scheduled = mem::take(&mut *self.future.borrow_mut());
        let mut pending = Vec::new();
        for (when, message) in scheduled {
            if when <= now {
                self.emit_message(&message);
                delivered += 1;
            } else {
                pending.push((when, message));
            }
        }

        let pending_count = {
            let mut future = self.future.borrow_mut();
            pending.append(&mut future);
            *future = pending;
            future.len()
        };

        self.tracer.flush_queue(now, delivered, pending_count);
        delivered
    }

    /// Discards all queued messages without delivering them.
    pub fn clear_queue(&self) {
        let mut dropped = self.queue.clear();
        let future = mem::take(&mut *self.future.borrow_mut());
        dropped.extend(future.into_iter().map(|(_, message)| message));

        for message in &dropped {
            self.tracer.drop_message(message, DropReason::Cleared);
        }
    }

    /// Returns the number of queued messages, both immediate and future.
    pub fn queued_messages(&self) -> usize { self.queue.len() + self.future.borrow().len() }
}

impl Default for MessagePump {
    fn default() -> Self { Self::new(Arc::new(Interner::new())) }
}

impl fmt::Debug for MessagePump {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MessagePump")
            .field("types", &self.registry.borrow().len())
            .field("queued", &self.queued_messages())
            .finish()
    }
}
