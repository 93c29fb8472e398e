//! Users API

use helfinka_types::{PasswordChange, ProfileUpdate, User, UserEnvelope, UserId};
use reqwest::Method;
use tracing::instrument;

use crate::metrics::Api;
use crate::{HttpClient, Result};

/// Client for `/users/{id}`
#[derive(Debug, Clone)]
pub struct UsersApi {
    client: HttpClient,
}

impl UsersApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Change email and/or display name, returning the stored profile
    #[instrument(skip(self, update), level = "debug")]
    pub async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<User> {
        let update = update.validate()?;
        let builder = self
            .client
            .request(Method::PATCH, self.user_url(user_id))
            .json(&update);

        let envelope: UserEnvelope = self
            .client
            .fetch_json(Api::Users, "update_profile", builder)
            .await?;
        Ok(envelope.user)
    }

    /// Change the password. The old password is checked by the service.
    #[instrument(skip(self, change), level = "debug")]
    pub async fn update_password(&self, user_id: &UserId, change: PasswordChange) -> Result<()> {
        let change = change.validate()?;
        let builder = self
            .client
            .request(Method::PATCH, self.user_url(user_id))
            .json(&change);

        self.client
            .fetch_empty(Api::Users, "update_password", builder)
            .await
    }

    fn user_url(&self, user_id: &UserId) -> String {
        let path = format!("/users/{}", urlencoding::encode(user_id.as_str()));
        self.client.config().url(&path)
    }
}
