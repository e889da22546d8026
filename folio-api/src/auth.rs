use crate::error::ApiError;
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use folio_store::{Permission, User, WorkspaceProvisioner};

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
}

impl AuthenticatedUser {
    pub fn as_user(&self) -> User {
        User {
            id: self.user_id.clone(),
            username: self.username.clone(),
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| headers.get(*name))
        .find_map(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Auth middleware - extracts the caller from headers set by the fronting proxy
///
/// The `x-folio-*` headers are preferred. For local development the plain
/// `x-user-id` / `x-user` headers are accepted, and either one alone is
/// enough to identify the caller.
pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let headers = req.headers();
    let user_id = header(headers, &["x-folio-user-id", "x-user-id"]);
    let username = header(headers, &["x-folio-username", "x-user"]);

    let user = match (user_id, username) {
        (Some(id), Some(name)) => AuthenticatedUser {
            user_id: id.to_string(),
            username: name.to_string(),
        },
        (Some(only), None) | (None, Some(only)) => AuthenticatedUser {
            user_id: only.to_string(),
            username: only.to_string(),
        },
        (None, None) => return Err(StatusCode::UNAUTHORIZED),
    };

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Check that the authenticated user is a member of the workspace
///
/// Returns the member's permissions, otherwise:
/// - ApiError::NotFound if the workspace doesn't exist
/// - ApiError::Forbidden if the user is not a member
pub async fn check_workspace_member(
    provisioner: &WorkspaceProvisioner,
    workspace_id: &str,
    user: &AuthenticatedUser,
) -> Result<Vec<Permission>, ApiError> {
    provisioner.get_workspace(workspace_id).await?;

    provisioner
        .user_permissions(workspace_id, &user.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Forbidden(format!(
                "Access denied: {} is not a member of workspace {}",
                user.username, workspace_id
            ))
        })
}

/// Check that the authenticated user holds `permission` in the workspace
pub async fn check_workspace_permission(
    provisioner: &WorkspaceProvisioner,
    workspace_id: &str,
    user: &AuthenticatedUser,
    permission: Permission,
) -> Result<(), ApiError> {
    let permissions = check_workspace_member(provisioner, workspace_id, user).await?;

    if !permissions.contains(&permission) {
        return Err(ApiError::Forbidden(format!(
            "Access denied: {:?} is required in workspace {}",
            permission, workspace_id
        )));
    }

    Ok(())
}
