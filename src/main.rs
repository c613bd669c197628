#[macro_use]
mod logger;
mod bot;
mod components;
mod config;
mod error;
mod tracker;

use std::fmt::Display;

trait ResultLog {
    type OkType;
    fn expect_log(self, msg: &str) -> Self::OkType;
}
impl<T, E: Display> ResultLog for Result<T, E> {
    type OkType = T;
    /// Log the error and exit with a non-zero code.
    fn expect_log(self, msg: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                log_error!("{}: {}", msg, e);
                std::process::exit(1)
            }
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = logger::init() {
        eprintln!("Could not install the logger: {}", e);
    }
    let config = config::Config::load().expect_log("Could not load the configuration");
    log::set_max_level(config.log_level);
    let mut bot = bot::Bot::new(&config).await.expect_log("Could not create the client");
    bot.start().await.expect_log("Client won't start");
}
