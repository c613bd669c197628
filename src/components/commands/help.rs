//! Lists the commands of the bot.

use serenity::async_trait;
use super::{Call, Command};

pub struct Help;

#[async_trait]
impl Command for Help {
    fn name(&self) -> &'static str {
        "help"
    }
    fn description(&self) -> &'static str {
        "Lists the commands. Add `info` after a command to get its description."
    }
    async fn execute(&self, call: &Call<'_>) -> Result<String, String> {
        let lines = call.registry.iter()
            .map(|cmd| match cmd.experimental() {
                true => format!("**{}** (experimental): {}", cmd.name(), cmd.description()),
                false => format!("**{}**: {}", cmd.name(), cmd.description()),
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(lines)
    }
}
