use std::sync::Arc;

use crate::{Components, event::ComponentEventDispatcher, Component};

/// # The component container
///
/// Stores the components of the bot until the client is built.
#[derive(Clone, Default)]
pub struct ComponentContainer(Components);

impl ComponentContainer {
    pub fn new() -> ComponentContainer {
        ComponentContainer(Vec::new())
    }
    /// Create a [`ComponentEventDispatcher`] from the components in the container.
    /// Components added afterward are not included in the dispatcher.
    pub fn get_event_dispatcher(&self) -> ComponentEventDispatcher {
        ComponentEventDispatcher::new(self.0.clone())
    }
    /// Add a component to the container.
    /// The typed pointer is returned so the caller can keep talking to the component.
    pub fn add_component<T: 'static + Component>(&mut self, comp: T) -> Arc<T> {
        let arc = Arc::new(comp);
        self.0.push(Arc::clone(&arc) as Arc<dyn Component>);
        arc
    }
    /// Names of the registered components, in dispatch order.
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|comp| comp.name()).collect()
    }
}
impl AsRef<Components> for ComponentContainer {
    fn as_ref(&self) -> &Components {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::{async_trait, client::Context, model::event::Event};
    use crate::ComponentEvent;

    struct Dummy(&'static str);
    #[async_trait]
    impl ComponentEvent for Dummy {
        async fn event(&self, _ctx: &Context, _event: &Event) {}
    }
    impl Component for Dummy {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn names_follow_registration_order() {
        let mut container = ComponentContainer::new();
        let first = container.add_component(Dummy("first"));
        container.add_component(Dummy("second"));
        assert_eq!(first.name(), "first");
        assert_eq!(container.names(), vec!["first", "second"]);
        assert_eq!(container.get_event_dispatcher().len(), 2);
    }
    #[test]
    fn dispatcher_ignores_late_components() {
        let mut container = ComponentContainer::new();
        let dispatcher = container.get_event_dispatcher();
        container.add_component(Dummy("late"));
        assert!(dispatcher.is_empty());
    }
}
