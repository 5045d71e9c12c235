use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::api::routes::state::AppState;
use crate::auth::authenticate;
use crate::error::AlertDeskError;
use crate::users::User;

/// The authenticated caller. Taking this as a handler argument runs
/// `authenticate`; the handler body never starts without a valid token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AlertDeskError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let authorization = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| AlertDeskError::Unauthenticated("Invalid token"))?,
            ),
            None => None,
        };

        authenticate(&state.db, &state.auth, authorization).map(CurrentUser)
    }
}
