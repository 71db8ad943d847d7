//! An entity/component registry with reflective properties and a message pump.
//!
//! # Entities and components
//! An [entity](entity::EntityId) is nothing but an id.
//! Its data lives in components,
//! and every component type is owned by exactly one [`EntitySystem`].
//! The [`EntityManager`] routes creation, lookup and deletion of components
//! to the owning system, so that the system can run its own setup and teardown.
//!
//! Component types are identified by interned names ([`StringId`]) rather than Rust types,
//! so that tools and data files can refer to them.
//! A system may declare a base type,
//! which lets lookups of the base type find components of the derived system.
//!
//! # Properties
//! Components expose their data by name through the [`Properties`](property::Properties) trait,
//! usually derived with `#[derive(Properties)]`.
//! Values are carried as [`Value`](property::Value)s of a fixed [`Kind`](property::Kind),
//! which allows [`Spawner`]s to apply templates to components
//! without knowing their concrete types.
//!
//! # Messages
//! Systems communicate through the [`MessagePump`].
//! Functors are registered per message type with a priority;
//! messages are dispatched either synchronously or from a thread-safe queue
//! that is flushed by the update loop.
//!
//! ```
//! use dtentity::message::Message;
//! use dtentity::pump::Options;
//! use dtentity::{EntityManager, StringId};
//!
//! const HELLO: StringId = StringId::of("Hello");
//!
//! let manager = EntityManager::new();
//! let functor = manager.pump().subscribe(HELLO, Options::default(), |message| {
//!     assert_eq!(message.ty(), HELLO);
//! });
//!
//! manager.enqueue_message(Message::new(HELLO));
//! assert_eq!(manager.emit_queued_messages(0.), 1);
//! assert!(manager.pump().unregister_for_messages(HELLO, &functor));
//! ```

#![cfg_attr(doc, warn(missing_docs))]

/// Derives [`Properties`](property::Properties) for a struct.
///
/// Each field becomes a property named after the field,
/// unless renamed with `#[property(name = "...")]`.
/// Fields can be excluded with `#[property(skip)]`,
/// and fields that implement `Properties` themselves can be inlined with `#[property(flatten)]`.
///
/// The struct-level attribute `#[properties(on_changed = path, finished = path)]`
/// forwards [`on_property_changed`](property::Properties::on_property_changed)
/// and [`finished`](property::Properties::finished) to free functions taking `&mut Self`.
pub use dtentity_codegen::Properties;

pub mod sid;
pub use sid::{Interner, StringId};

pub mod property;

pub mod message;
pub use message::Message;

pub mod pump;
pub use pump::MessagePump;

pub mod tracer;

pub mod storage;
pub use storage::Storage;

pub mod entity;
pub use entity::EntityId;

pub mod system;
pub use system::{Component, EntitySystem};

pub mod manager;
pub use manager::{EntityManager, Error};

pub mod spawner;
pub use spawner::Spawner;

#[cfg(any(test, feature = "internal-bench"))]
pub mod test_util;
