use std::time::{Duration, Instant};
use serenity::{model::event::{Event, EventType}, client::Context, async_trait};
pub use serenity::prelude::RawEventHandler;
use crate::{Component, Components};

/// # The component event trait.
///
/// Every component must implement this trait to receive gateway events from
/// the [`ComponentEventDispatcher`]. It is up to the component to pick the
/// events it needs and to handle its own failures: nothing is reported back
/// to the dispatcher.
#[async_trait]
pub trait ComponentEvent: Sync + Send {
    async fn event(&self, ctx: &Context, event: &Event);
}

/// # The component event dispatcher.
///
/// Forwards each gateway event to the components, one after another, in
/// registration order.
///
/// See [`serenity::client::ClientBuilder::raw_event_handler()`] for more information.
pub struct ComponentEventDispatcher {
    components: Components
}

impl ComponentEventDispatcher {
    pub(crate) fn new(components: Components) -> Self {
        Self { components }
    }
    /// Number of components receiving the events.
    pub fn len(&self) -> usize {
        self.components.len()
    }
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// A component holding an event longer than this delays every component after it.
pub const SLOW_EVENT: Duration = Duration::from_secs(2);

fn slow_report(component: &str, kind: &EventType, elapsed: Duration) -> Option<String> {
    (elapsed >= SLOW_EVENT).then(|| format!("{} took {} ms to handle {:?}", component, elapsed.as_millis(), kind))
}

#[async_trait]
impl RawEventHandler for ComponentEventDispatcher {
    async fn raw_event(&self, ctx: Context, ev: Event) {
        for comp in &self.components {
            let start = Instant::now();
            comp.event(&ctx, &ev).await;
            if let Some(report) = slow_report(comp.name(), &ev.event_type(), start.elapsed()) {
                log::warn!(target: "jester", "{}", report);
            }
        }
    }
}
