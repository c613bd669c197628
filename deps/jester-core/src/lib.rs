//! # Core library of jester
//!
//! Components are the building blocks of the bot. Each component owns its own
//! state and reacts to the Discord gateway events it cares about.
//!
//! A component implements the [`Component`] trait, which is composed of:
//! - a name, used in logs,
//! - [`ComponentEvent`], which receives every gateway event.
//!
//! Components are registered into a [`ComponentContainer`], which hands out
//! a [`ComponentEventDispatcher`] to plug into the [`serenity`] client.

pub mod event;
pub mod container;
use std::sync::Arc;

pub use event::ComponentEvent;
pub use container::ComponentContainer;

pub trait Component: ComponentEvent {
    /// Name of the component, as shown in logs.
    fn name(&self) -> &'static str;
}
pub type Components = Vec<Arc<dyn Component>>;
