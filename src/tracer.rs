//! Exposes profiling and tracing hooks of the message pump.

use std::fmt;
use std::time::Instant;

use crate::message::{Message, MessageType};
use crate::pump::Options;

/// A handler that receives dispatch-related events from a [`MessagePump`](crate::pump::MessagePump).
///
/// All methods default to doing nothing,
/// so implementations only override the events they are interested in.
pub trait Tracer {
    /// A functor has been registered.
    fn register(&self, _ty: MessageType, _debug_name: &str, _options: Options) {}

    /// A message is about to be dispatched to `handlers` functors.
    fn emit(&self, _message: &Message, _handlers: usize) {}

    /// A functor is about to be called.
    fn start_handler(&self, _ty: MessageType, _debug_name: &str) -> HandlerContext {
        HandlerContext::default()
    }

    /// A functor has returned.
    fn end_handler(&self, _context: HandlerContext, _ty: MessageType, _debug_name: &str) {}

    /// A message was discarded without being dispatched.
    fn drop_message(&self, _message: &Message, _reason: DropReason) {}

    /// Queued messages have been flushed.
    ///
    /// `delivered` messages were emitted and `pending` future messages are not yet due.
    fn flush_queue(&self, _now: f64, _delivered: usize, _pending: usize) {}
}

impl<T: Tracer + ?Sized> Tracer for Box<T> {
    fn register(&self, ty: MessageType, debug_name: &str, options: Options) {
        (**self).register(ty, debug_name, options)
    }

    fn emit(&self, message: &Message, handlers: usize) { (**self).emit(message, handlers) }

    fn start_handler(&self, ty: MessageType, debug_name: &str) -> HandlerContext {
        (**self).start_handler(ty, debug_name)
    }

    fn end_handler(&self, context: HandlerContext, ty: MessageType, debug_name: &str) {
        (**self).end_handler(context, ty, debug_name)
    }

    fn drop_message(&self, message: &Message, reason: DropReason) {
        (**self).drop_message(message, reason)
    }

    fn flush_queue(&self, now: f64, delivered: usize, pending: usize) {
        (**self).flush_queue(now, delivered, pending)
    }
}

/// Context passed from [`Tracer::start_handler`] to [`Tracer::end_handler`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HandlerContext {
    start: Option<Instant>,
}

impl HandlerContext {
    /// Creates a context that records the current time.
    pub fn now() -> Self { Self { start: Some(Instant::now()) } }

    /// Returns the time at which the handler started, if it was recorded.
    pub fn start(&self) -> Option<Instant> { self.start }

    fn or(self, other: Self) -> Self { Self { start: self.start.or(other.start) } }
}

/// The reason for [`Tracer::drop_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The message type is [`StringId::NONE`](crate::StringId::NONE).
    EmptyType,
    /// The message was pending in a queue that got cleared.
    Cleared,
}

/// An empty tracer.
pub struct Noop;

impl Tracer for Noop {}

/// Groups two tracers and dispatches each call to them in serial.
pub struct Aggregate<A, B>(pub A, pub B);

impl<A: Tracer, B: Tracer> Tracer for Aggregate<A, B> {
    fn register(&self, ty: MessageType, debug_name: &str, options: Options) {
        self.0.register(ty, debug_name, options);
        self.1.register(ty, debug_name, options);
    }

    fn emit(&self, message: &Message, handlers: usize) {
        self.0.emit(message, handlers);
        self.1.emit(message, handlers);
    }

    fn start_handler(&self, ty: MessageType, debug_name: &str) -> HandlerContext {
        let first = self.0.start_handler(ty, debug_name);
        let second = self.1.start_handler(ty, debug_name);
        first.or(second)
    }

    fn end_handler(&self, context: HandlerContext, ty: MessageType, debug_name: &str) {
        self.0.end_handler(context, ty, debug_name);
        self.1.end_handler(context, ty, debug_name);
    }

    fn drop_message(&self, message: &Message, reason: DropReason) {
        self.0.drop_message(message, reason);
        self.1.drop_message(message, reason);
    }

    fn flush_queue(&self, now: f64, delivered: usize, pending: usize) {
        self.0.flush_queue(now, delivered, pending);
        self.1.flush_queue(now, delivered, pending);
    }
}

/// A tracer that logs all events.
pub struct Log(
    /// The log level to log events with.
    pub log::Level,
);

impl Tracer for Log {
    fn register(&self, ty: MessageType, debug_name: &str, options: Options) {
        log::log!(self.0, "register({ty}, {debug_name:?}, {options:?})");
    }

    fn emit(&self, message: &Message, handlers: usize) {
        log::log!(self.0, "emit({}, handlers: {handlers})", message.ty());
    }

    fn start_handler(&self, ty: MessageType, debug_name: &str) -> HandlerContext {
        log::log!(self.0, "start_handler({ty}, {debug_name:?})");
        HandlerContext::now()
    }

    fn end_handler(&self, context: HandlerContext, ty: MessageType, debug_name: &str) {
        log::log!(self.0, "end_handler({ty}, {debug_name:?}, elapsed: {})", ElapsedFmt(context));
    }

    fn drop_message(&self, message: &Message, reason: DropReason) {
        log::log!(self.0, "drop_message({}, {reason:?})", message.ty());
    }

    fn flush_queue(&self, now: f64, delivered: usize, pending: usize) {
        log::log!(self.0, "flush_queue(now: {now}, delivered: {delivered}, pending: {pending})");
    }
}

struct ElapsedFmt(HandlerContext);

impl fmt::Display for ElapsedFmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.start {
            Some(start) => write!(f, "{:?}", start.elapsed()),
            None => write!(f, "unknown"),
        }
    }
}
