use serenity::async_trait;
use super::{Call, Command};

pub struct Ping;

#[async_trait]
impl Command for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }
    fn description(&self) -> &'static str {
        "Pong!"
    }
    async fn execute(&self, _call: &Call<'_>) -> Result<String, String> {
        Ok("Pong!".to_string())
    }
}
