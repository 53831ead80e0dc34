use aide::axum::{
    routing::{get_with, post_with, put_with},
    ApiRouter,
};
use axum::Json;

use crate::api::{self, branches::MessageResponse, AppState};
use crate::database::models::{BranchResponse, BranchTreeResponse};

pub fn branch_routes() -> ApiRouter<AppState> {
    ApiRouter::new()
        .api_route(
            "/branches/create-branch",
            post_with(api::branches::create_branch, |op| {
                op.description("Fork a new chat from one answer")
                    .id("Branch.createBranch")
                    .tag("branches")
                    .response::<200, Json<BranchResponse>>()
            }),
        )
        .api_route(
            "/branches/get-branches",
            get_with(api::branches::get_branches, |op| {
                op.description("List the direct branches of a chat")
                    .id("Branch.getBranches")
                    .tag("branches")
                    .response::<200, Json<Vec<BranchResponse>>>()
            }),
        )
        .api_route(
            "/branches/get-branch-tree",
            get_with(api::branches::get_branch_tree, |op| {
                op.description("Get the full branch tree rooted at a chat")
                    .id("Branch.getBranchTree")
                    .tag("branches")
                    .response::<200, Json<BranchTreeResponse>>()
            }),
        )
        .api_route(
            "/branches/set-active-branch",
            put_with(api::branches::set_active_branch, |op| {
                op.description("Mark one branch of a chat as active")
                    .id("Branch.setActiveBranch")
                    .tag("branches")
                    .response::<200, Json<MessageResponse>>()
            }),
        )
}
