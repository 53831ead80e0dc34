use aide::axum::{routing::post_with, ApiRouter};
use axum::Json;

use crate::api::{self, AppState};
use crate::database::models::QaPair;

pub fn message_routes() -> ApiRouter<AppState> {
    ApiRouter::new().api_route(
        "/messages/add-message",
        post_with(api::messages::add_message, |op| {
            op.description("Ask a question and store the generated answer")
                .id("Message.addMessage")
                .tag("messages")
                .response::<201, Json<QaPair>>()
        }),
    )
}
