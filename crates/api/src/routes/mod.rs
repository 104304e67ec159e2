pub mod admin;
pub mod auth;
pub mod collaborators;
pub mod health;
pub mod modules;
pub mod notification;
pub mod orders;
pub mod transfers;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/otp/request                      request login code (public)
/// /auth/otp/verify                       verify code, login/register (public)
/// /auth/me                               own profile
/// /auth/me/capabilities                  UI visibility hints
///
/// /orders                                list, create
/// /orders/queue                          manager work queue by status
/// /orders/{id}                           get, patch (draft)
/// /orders/{id}/submit|approve|reject     pipeline steps
/// /orders/{id}/schedule|start|complete
/// /orders/{id}/pay|close
/// /orders/{id}/stage                     execution stage move
/// /orders/{id}/archive|deep-archive      archival flags
/// /orders/{id}/transfers                 list, create transfer requests
/// /orders/{id}/collaborators             list, invite
/// /orders/{id}/ownership-chain           provenance projection
/// /orders/{id}/events                    audit trail (managers)
///
/// /transfers/pending                     manager review queue
/// /transfers/incoming                    requests awaiting the caller
/// /transfers/{id}/approve|reject         manager gate
/// /transfers/{id}/accept|decline         recipient gate
///
/// /collaborators/{id}/respond            invitee answer
/// /collaborators/{id}                    withdraw pending invite (DELETE)
/// /collaborators/{id}/revoke             owner revokes accepted (DELETE)
///
/// /modules/locks/acquire|release         lock handshake (forced takeover)
/// /modules/locks/status                  lock view for the caller
/// /modules/draft                         holder's in-flight payload (PUT)
/// /modules/versions                      save (POST), list (GET)
/// /modules/versions/{version}            load one version
/// /modules/versions/{version}/restore    re-save old payload as new version
///
/// /notifications                         list
/// /notifications/{id}/read               mark one read
/// /notifications/read-all                mark all read
/// /notifications/unread-count            badge count
///
/// /admin/users                           list users
/// /admin/users/{id}                      update user (PATCH)
/// /admin/users/{id}/grants               whitelist grants for a user
/// /admin/grants                          create grant
/// /admin/grants/{id}                     delete grant
/// /admin/positions                       position lookup
/// /admin/service-scopes                  service scope lookup
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/orders", orders::router())
        .nest("/transfers", transfers::router())
        .nest("/collaborators", collaborators::router())
        .nest("/modules", modules::router())
        .nest("/notifications", notification::router())
        .nest("/admin", admin::router())
}
