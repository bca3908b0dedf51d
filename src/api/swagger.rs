use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Directory Service API",
        version = "1.0.0",
        description = "CRUD over the `users` collection plus two one-off migrations between `users` and the schema-less `friends` collection.\n\n**No authentication.** `DELETE /api/users/clear/all` is destructive and ungated."
    ),
    paths(
        // Users
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::create_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,
        crate::api::users::clear_users,

        // Diagnostics & migrations
        crate::api::debug::debug_snapshot,
        crate::api::migrations::migrate_users_to_friends,
        crate::api::migrations::migrate_friends,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::models::UserResponse,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            crate::models::DeleteUserResponse,
            crate::models::MessageResponse,
            crate::services::debug_service::DebugSnapshot,
            crate::services::migration_service::UsersToFriendsReport,
            crate::services::migration_service::FriendsToUsersReport,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Users", description = "User resource, addressed by the public `userId` (e.g. `user001`)."),
        (name = "Diagnostics", description = "Read-only snapshot of both collections."),
        (name = "Migrations", description = "Batch copies between `users` and `friends`. Per-record errors are reported, never rolled back."),
        (name = "Health", description = "Liveness and database reachability."),
    )
)]
pub struct ApiDoc;
