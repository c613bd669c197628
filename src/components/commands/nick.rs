use serenity::async_trait;
use super::{Call, Command};

/// Tells the caller whether they currently wear the override nickname.
pub struct Nick;

#[async_trait]
impl Command for Nick {
    fn name(&self) -> &'static str {
        "nick"
    }
    fn description(&self) -> &'static str {
        "Shows the override nickname and whether you currently wear it."
    }
    async fn execute(&self, call: &Call<'_>) -> Result<String, String> {
        let nickname = &call.env.override_nickname;
        if nickname.is_empty() {
            return Ok("Nickname override is disabled.".to_string());
        }
        Ok(match call.env.sessions.contains(call.author).await {
            true => format!("You are currently known as **{}**.", nickname),
            false => format!("The override nickname is **{}**. You are not wearing it.", nickname),
        })
    }
    async fn debug(&self, call: &Call<'_>) -> Result<String, String> {
        let session = call.env.sessions.get(call.author).await;
        Ok(format!("{} session(s) active. Yours: {:?}", call.env.sessions.len().await, session))
    }
}
