use crate::api::ApiClient;
use crate::errors::ClientError;
use crate::models::{AuthResponse, Credentials, Registration, User};
use crate::session::{Session, SessionContext, SessionState};
use tracing::{info, warn};

/// Verifies a stored token once at startup.
///
/// The session must already be `Authenticating`; it settles as signed in when
/// the server accepts the token and as signed out on any failure.
pub async fn verify_stored_token(client: &ApiClient, session: &SessionContext) {
    let SessionState::Authenticating { token } = session.snapshot().await else {
        return;
    };

    let user = match client.current_user().await {
        Ok(user) => {
            info!(user = %user.username, "stored credentials accepted");
            Some(user)
        }
        Err(err) => {
            warn!("stored credentials rejected: {err}");
            None
        }
    };
    session.settle_check(&token, user).await;
}

/// Signs in with fresh credentials.
///
/// Any current session ends first, so the request carries no bearer token and
/// rejected credentials cannot be mistaken for an expired session.
pub async fn login(
    client: &ApiClient,
    session: &SessionContext,
    credentials: &Credentials,
) -> Result<User, ClientError> {
    session.logout().await;
    let response = client.login(credentials).await?;
    Ok(start_session(session, response).await)
}

pub async fn register(
    client: &ApiClient,
    session: &SessionContext,
    registration: &Registration,
) -> Result<User, ClientError> {
    session.logout().await;
    let response = client.register(registration).await?;
    Ok(start_session(session, response).await)
}

async fn start_session(session: &SessionContext, response: AuthResponse) -> User {
    let user = response.user.clone();
    session
        .establish(Session {
            user: response.user,
            token: response.token,
        })
        .await;
    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notices::Notices;
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode, header},
        response::{IntoResponse, Response},
        routing::post,
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::TcpListener;

    type SeenAuth = Arc<Mutex<Vec<Option<String>>>>;

    async fn spawn_backend(seen: SeenAuth) -> String {
        async fn login(
            State(seen): State<SeenAuth>,
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> Response {
            let bearer = headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            seen.lock().expect("seen headers").push(bearer);
            if body["password"] != "secret1" {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            Json(serde_json::json!({
                "token": "fresh",
                "user": { "id": 2, "username": body["username"], "email": null }
            }))
            .into_response()
        }

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .with_state(seen);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}/api")
    }

    fn signed_in(notices: Notices) -> SessionContext {
        SessionContext::with_session(
            Session {
                user: User {
                    id: 1,
                    username: "alex".into(),
                    email: None,
                },
                token: "valid".into(),
            },
            notices,
        )
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            username: "sam".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn rejected_login_is_not_reported_as_expiry() {
        let seen = SeenAuth::default();
        let base = spawn_backend(seen.clone()).await;
        let notices = Notices::new();
        let session = signed_in(notices.clone());
        let client = ApiClient::new(base, Duration::from_secs(5), session.clone()).expect("client");

        let result = login(&client, &session, &credentials("wrong-one")).await;
        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert_eq!(session.snapshot().await, SessionState::Unauthenticated);
        assert!(notices.is_empty().await);
        assert_eq!(*seen.lock().expect("seen headers"), vec![None]);
    }

    #[tokio::test]
    async fn login_replaces_the_previous_session() {
        let seen = SeenAuth::default();
        let base = spawn_backend(seen.clone()).await;
        let session = signed_in(Notices::new());
        let client = ApiClient::new(base, Duration::from_secs(5), session.clone()).expect("client");

        let user = login(&client, &session, &credentials("secret1")).await.expect("login");
        assert_eq!(user.username, "sam");
        assert_eq!(session.token().await.as_deref(), Some("fresh"));
        assert_eq!(*seen.lock().expect("seen headers"), vec![None]);
    }
}
