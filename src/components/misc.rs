//! Miscellaneous events.

use jester_core::{Component, ComponentEvent};
use serenity::{async_trait, client::Context, model::event::Event};
use crate::log_info;

pub struct Misc {
    components: Vec<&'static str>,
}

impl Misc {
    /// `components` are the names of the other components, for the startup log.
    pub fn new(components: Vec<&'static str>) -> Self {
        Self { components }
    }
}

#[async_trait]
impl ComponentEvent for Misc {
    async fn event(&self, _ctx: &Context, event: &Event) {
        if let Event::Ready(ready) = event {
            log_info!("Logged in as {} (version {})", ready.ready.user.tag(), env!("CARGO_PKG_VERSION"));
            log_info!("Components: {}", self.components.join(", "));
        }
    }
}

impl Component for Misc {
    fn name(&self) -> &'static str {
        "misc"
    }
}
