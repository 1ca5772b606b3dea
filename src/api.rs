//! REST client for the fitness backend.
//!
//! Every call attaches the session token as a bearer credential when one is
//! held. A `401` clears the session through [`SessionContext::expire`]; callers
//! are expected to drop cached data and send the user back to the login view.

use crate::errors::ClientError;
use crate::models::{
    AuthResponse, Created, Credentials, Exercise, NewExercise, NewWorkout, Registration, User,
    Workout,
};
use crate::session::SessionContext;
use reqwest::{Client, Method, StatusCode, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SessionContext,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let url = self.url(path);
        let token = self.session.token().await;

        let mut builder = self.http.request(method.clone(), &url);
        if let Some(token) = token.as_deref() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        debug!(%method, %url, "api request");
        let response = builder
            .send()
            .await
            .map_err(|err| ClientError::transport(url.as_str(), &err))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, %url, "api request rejected as unauthorized");
            if let Some(token) = token.as_deref() {
                self.session.expire(token).await;
            }
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "api request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::transport(url.as_str(), &err))?;

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        if !is_json {
            warn!(%url, "api returned a non-JSON body");
            return Err(ClientError::malformed(url, &bytes));
        }
        serde_json::from_slice(&bytes).map_err(|_| ClientError::malformed(url, &bytes))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let value = self.request(method, path, body.as_ref()).await?;
        serde_json::from_value(value).map_err(|err| ClientError::MalformedResponse {
            url: self.url(path),
            snippet: err.to_string(),
        })
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body)?;
        self.call(method, path, Some(body)).await
    }

    pub async fn exercises(&self) -> Result<Vec<Exercise>, ClientError> {
        self.call(Method::GET, "/exercises", None).await
    }

    pub async fn exercise(&self, id: i64) -> Result<Exercise, ClientError> {
        self.call(Method::GET, &format!("/exercises/{id}"), None).await
    }

    pub async fn create_exercise(&self, exercise: &NewExercise) -> Result<Created, ClientError> {
        self.send(Method::POST, "/exercises", exercise).await
    }

    pub async fn workouts(&self) -> Result<Vec<Workout>, ClientError> {
        self.call(Method::GET, "/workouts", None).await
    }

    pub async fn workout(&self, id: i64) -> Result<Workout, ClientError> {
        self.call(Method::GET, &format!("/workouts/{id}"), None).await
    }

    pub async fn create_workout(&self, workout: &NewWorkout) -> Result<Created, ClientError> {
        self.send(Method::POST, "/workouts", workout).await
    }

    pub async fn update_workout(
        &self,
        id: i64,
        workout: &NewWorkout,
    ) -> Result<Value, ClientError> {
        self.send(Method::PUT, &format!("/workouts/{id}"), workout).await
    }

    pub async fn delete_workout(&self, id: i64) -> Result<Value, ClientError> {
        self.request(Method::DELETE, &format!("/workouts/{id}"), None).await
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        self.request(Method::GET, "/health", None).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        self.send(Method::POST, "/auth/login", credentials).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ClientError> {
        self.send(Method::POST, "/auth/register", registration).await
    }

    /// Checks the held token and returns the user it belongs to.
    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.call(Method::GET, "/auth/me", None).await
    }
}
