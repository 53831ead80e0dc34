use aide::axum::{
    routing::{get_with, post_with},
    ApiRouter,
};
use axum::Json;

use crate::api::{self, AppState};
use crate::database::models::{TokenResponse, UserResponse};

pub fn auth_routes() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route(
            "/auth/register",
            post_with(api::auth::register, |op| {
                op.description("Register a new account")
                    .id("Auth.register")
                    .tag("auth")
                    .response::<200, Json<UserResponse>>()
            }),
        )
        .api_route(
            "/auth/login",
            post_with(api::auth::login, |op| {
                op.description("Exchange username or email and password for a bearer token")
                    .id("Auth.login")
                    .tag("auth")
                    .response::<200, Json<TokenResponse>>()
            }),
        )
}

pub fn protected_auth_routes() -> ApiRouter<AppState> {
    ApiRouter::new().api_route(
        "/auth/me",
        get_with(api::auth::me, |op| {
            op.description("Get the current user")
                .id("Auth.me")
                .tag("auth")
                .response::<200, Json<UserResponse>>()
        }),
    )
}
