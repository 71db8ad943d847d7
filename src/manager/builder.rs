use std::sync::Arc;

use super::EntityManager;
use crate::message::builtin;
use crate::pump::{self, MessagePump};
use crate::sid::Interner;
use crate::system::EntitySystem;
use crate::tracer::{self, Tracer};

/// A bundle of entity systems and initial entities.
///
/// Bundles let libraries package the systems they need
/// without knowing about each other.
pub trait Bundle {
    /// Registers the entity systems used by this bundle.
    fn register(&self, _builder: &mut Builder) {}

    /// Populates the manager with entities and components.
    ///
    /// Called after the systems of all bundles have been registered.
    fn populate(&self, _manager: &mut EntityManager) {}
}

/// Creates an entity manager from bundles.
pub fn new<'t>(bundles: impl IntoIterator<Item = &'t dyn Bundle> + Copy) -> EntityManager {
    let mut builder = Builder::new();

    for bundle in bundles {
        bundle.register(&mut builder);
    }

    let mut manager = builder.build();

    for bundle in bundles {
        bundle.populate(&mut manager);
    }

    manager
}

/// This type is used to build an entity manager.
pub struct Builder {
    interner:      Option<Arc<Interner>>,
    config:        pump::Config,
    tracer:        Box<dyn Tracer>,
    flush_on_drop: bool,
    systems:       Vec<Box<dyn EntitySystem>>,
}

impl Builder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            interner:      None,
            config:        pump::Config::default(),
            tracer:        Box::new(tracer::Noop),
            flush_on_drop: true,
            systems:       Vec::new(),
        }
    }

    /// Shares an existing interner instead of creating a new one.
    pub fn with_interner(mut self, interner: Arc<Interner>) -> Self {
        self.interner = Some(interner);
        self
    }

    /// Sets the tracer of the message pump.
    pub fn with_tracer(mut self, tracer: impl Tracer + 'static) -> Self {
        self.tracer = Box::new(tracer);
        self
    }

    /// Sets the settings of the message pump.
    pub fn with_pump_config(mut self, config: pump::Config) -> Self {
        self.config = config;
        self
    }

    /// Sets whether dropping the manager delivers all queued messages first.
    ///
    /// Enabled by default.
    pub fn with_flush_on_drop(mut self, flush_on_drop: bool) -> Self {
        self.flush_on_drop = flush_on_drop;
        self
    }

    /// Registers an entity system to add when the manager is built.
    pub fn add_system(&mut self, system: impl EntitySystem) {
        self.systems.push(Box::new(system));
    }

    /// Constructs the manager from the builder.
    ///
    /// The names of all built-in messages are recorded in the interner,
    /// and the registered systems are added in registration order.
    pub fn build(self) -> EntityManager {
        let interner = self.interner.unwrap_or_default();
        interner.preload(builtin::NAMES.iter().copied());

        let pump = MessagePump::with_config(Arc::clone(&interner), self.config, self.tracer);
        let mut manager = EntityManager::from_parts(interner, pump, self.flush_on_drop);

        for system in self.systems {
            if let Err(err) = manager.add_boxed_entity_system(system) {
                log::error!("Cannot add entity system: {err}");
            }
        }

        manager
    }
}

impl Default for Builder {
    fn default() -> Self { Self::new() }
}
