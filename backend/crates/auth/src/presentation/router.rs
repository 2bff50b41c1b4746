//! Auth and User Routers

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{PermissionLayer, authenticate, ensure_permissions};

pub const PERMISSION_USER_CREATE: &str = "user:create";
pub const PERMISSION_USER_DELETE: &str = "user:delete";

/// Routes under `/api/v1/auth`
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route("/long-life-token", post(handlers::long_life_token::<R>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate::<R>,
        ));

    Router::new()
        .route("/login", post(handlers::login::<R>))
        .route("/sign-in", post(handlers::sign_in::<R>))
        .route("/refresh_token", post(handlers::refresh_token::<R>))
        .merge(protected)
        .with_state(state)
}

/// Routes under `/api/v1/users`; every route requires an active caller
pub fn users_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    let can_create = PermissionLayer::new(state.repo.clone(), [PERMISSION_USER_CREATE]);
    let can_delete = PermissionLayer::new(state.repo.clone(), [PERMISSION_USER_DELETE]);

    let create = Router::new()
        .route("/", post(handlers::create_user::<R>))
        .route_layer(middleware::from_fn_with_state(
            can_create,
            ensure_permissions::<R>,
        ));

    let deactivate = Router::new()
        .route("/{user_id}/disactive", delete(handlers::deactivate_user::<R>))
        .route_layer(middleware::from_fn_with_state(
            can_delete,
            ensure_permissions::<R>,
        ));

    // Layers added later run first, so authentication wraps the permission checks
    Router::new()
        .route(
            "/{user_id}",
            get(handlers::get_user::<R>)
                .patch(handlers::patch_user::<R>)
                .put(handlers::put_user::<R>),
        )
        .route("/me/password", post(handlers::change_password::<R>))
        .merge(create)
        .merge(deactivate)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate::<R>,
        ))
        .with_state(state)
}
