pub mod cli;
pub mod http;

pub use cli::{classify_calldata, Classification, CliHandler, Cli, Commands, CliError};
pub use http::{
    create_router, health, receive_webhook, replay_sample, ApiError, AppState, HealthResponse, TestResponse,
    WebhookResponse, WebhookServer,
};
