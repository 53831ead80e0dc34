use aide::axum::{
    routing::{delete_with, get_with, post_with, put_with},
    ApiRouter,
};
use axum::Json;

use crate::api::{self, AppState};
use crate::database::models::{Chat, ChatWithContent};

pub fn chat_routes() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route(
            "/chats/create-chat",
            post_with(api::chats::create_chat, |op| {
                op.description("Create a chat with empty content")
                    .id("Chat.createChat")
                    .tag("chats")
                    .response::<201, Json<Chat>>()
            }),
        )
        .api_route(
            "/chats/get-chat",
            get_with(api::chats::get_chat, |op| {
                op.description("Get a chat with its question/answer pairs")
                    .id("Chat.getChat")
                    .tag("chats")
                    .response::<200, Json<ChatWithContent>>()
            }),
        )
        .api_route(
            "/chats/list-chats",
            get_with(api::chats::list_chats, |op| {
                op.description("List the current user's chats")
                    .id("Chat.listChats")
                    .tag("chats")
                    .response::<200, Json<Vec<Chat>>>()
            }),
        )
        .api_route(
            "/chats/update-chat",
            put_with(api::chats::update_chat, |op| {
                op.description("Rename or deactivate a chat")
                    .id("Chat.updateChat")
                    .tag("chats")
                    .response::<200, Json<Chat>>()
            }),
        )
        .api_route(
            "/chats/delete-chat",
            delete_with(api::chats::delete_chat, |op| {
                op.description("Delete a chat and its content")
                    .id("Chat.deleteChat")
                    .tag("chats")
                    .response::<204, ()>()
            }),
        )
}
