use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use super::{errors::AppError, AppState};
use crate::{auth::AuthError, sessions::Session};

/// The session behind the request's bearer token.
pub struct CurrentUser(pub Session);

/// Like [`CurrentUser`], but only for roles with the admin permission.
pub struct AdminUser(pub Session);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let session = state.sessions.authenticate(token).await?;
        Ok(Self(session))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(session) = CurrentUser::from_request_parts(parts, state).await?;
        if !session.user.is_admin {
            return Err(AuthError::AdminRequired.into());
        }
        Ok(Self(session))
    }
}

fn bearer_token(parts: &Parts) -> Result<Uuid, AuthError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or(AuthError::MissingToken)?;
    Uuid::parse_str(token.trim()).map_err(|_| AuthError::UnknownSession)
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/pools");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn missing_or_malformed_header_is_missing_token() {
        assert!(matches!(bearer_token(&parts(None)), Err(AuthError::MissingToken)));
        assert!(matches!(
            bearer_token(&parts(Some("Basic abc"))),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn non_uuid_token_is_unknown_session() {
        assert!(matches!(
            bearer_token(&parts(Some("Bearer not-a-uuid"))),
            Err(AuthError::UnknownSession)
        ));
    }

    #[test]
    fn uuid_token_is_parsed() {
        let id = Uuid::new_v4();
        assert_eq!(bearer_token(&parts(Some(&format!("Bearer {id}")))).unwrap(), id);
    }
}
