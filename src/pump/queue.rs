use std::collections::VecDeque;
use std::mem;

use parking_lot::Mutex;

use crate::message::Message;

/// A thread-safe inbox of a [`MessagePump`](super::MessagePump).
///
/// Messages enqueued here are only delivered when the owning thread calls
/// [`MessagePump::emit_queued_messages`](super::MessagePump::emit_queued_messages).
#[derive(Debug)]
pub struct MessageQueue {
    immediate: Mutex<VecDeque<Message>>,
    future:    Mutex<Vec<(f64, Message)>>,
    threshold: f64,
}

impl MessageQueue {
    pub(super) fn new(threshold: f64) -> Self {
        Self { immediate: Mutex::default(), future: Mutex::default(), threshold }
    }

    /// Queues a message for the next flush.
    pub fn enqueue(&self, message: Message) { self.immediate.lock().push_back(message); }

    /// Queues a message for the first flush at or after the simulation time `when`.
    pub fn enqueue_at(&self, message: Message, when: f64) {
        if when <= self.threshold {
            self.enqueue(message);
        } else {
            self.future.lock().push((when, message));
        }
    }

    /// Returns the number of messages waiting in this queue.
    pub fn len(&self) -> usize { self.immediate.lock().len() + self.future.lock().len() }

    /// Whether no messages are waiting in this queue.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Pops one immediate message.
    ///
    /// The lock is released before returning so that the caller may enqueue while dispatching.
    pub(super) fn pop_immediate(&self) -> Option<Message> { self.immediate.lock().pop_front() }

    pub(super) fn take_future(&self) -> Vec<(f64, Message)> { mem::take(&mut *self.future.lock()) }

    /// Empties the queue, returning the discarded messages.
    pub(super) fn clear(&self) -> Vec<Message> {
        let mut dropped: Vec<_> = self.immediate.lock().drain(..).collect();
        dropped.extend(self.take_future().into_iter().map(|(_, message)| message));
        dropped
    }
}

static_assertions::assert_impl_all!(MessageQueue: Send, Sync);
