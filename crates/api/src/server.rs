use crate::error::ApiError;
use crate::http::{HttpClient, HttpRequest};
use crate::wire::*;

/// Typed access to the dashboard server's JSON endpoints.
///
/// State-changing calls carry the CSRF token when one is known.
pub struct ServerApi<'a, H> {
    http: &'a H,
    base_url: &'a str,
    csrf_token: Option<String>,
}

impl<'a, H: HttpClient> ServerApi<'a, H> {
    pub fn new(http: &'a H, base_url: &'a str, csrf_token: Option<String>) -> Self {
        Self {
            http,
            base_url,
            csrf_token,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn csrf(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    async fn ack(&self, req: HttpRequest) -> Result<Ack, ApiError> {
        let ack: Ack = self.http.send(req).await?.json()?;
        if ack.success {
            Ok(ack)
        } else {
            Err(ApiError::rejected(ack.error))
        }
    }

    pub async fn user_locations(&self) -> Result<Vec<UserLocation>, ApiError> {
        let resp = self
            .http
            .send(HttpRequest::get(self.url("/api/admin/user-locations/")))
            .await?;
        let body: UserLocationsResponse = resp.json()?;
        if body.success {
            Ok(body.locations)
        } else {
            Err(ApiError::rejected(body.error))
        }
    }

    pub async fn update_user_location(&self, update: &UserLocationUpdate) -> Result<Ack, ApiError> {
        let req = HttpRequest::post_json(self.url("/api/user-location/"), update)?.with_csrf(self.csrf());
        self.ack(req).await
    }

    /// Returns the reply even when the server marks it as a fallback.
    pub async fn chatbot(&self, request: &ChatbotRequest) -> Result<ChatbotResponse, ApiError> {
        let req = HttpRequest::post_json(self.url("/api/chatbot/"), request)?;
        let body: ChatbotResponse = self.http.send(req).await?.json()?;
        if body.success && body.response.is_some() {
            Ok(body)
        } else {
            Err(ApiError::rejected(body.error))
        }
    }

    pub async fn admin_chat_history(&self, limit: usize) -> Result<Vec<AdminConversation>, ApiError> {
        let url = self.url(&format!("/api/admin/chat-history/?limit={limit}"));
        let body: AdminChatHistoryResponse = self.http.send(HttpRequest::get(url)).await?.json()?;
        if body.success {
            Ok(body.conversations)
        } else {
            Err(ApiError::rejected(body.error))
        }
    }

    pub async fn delete_admin_chat(&self, session_id: &str) -> Result<Ack, ApiError> {
        let body = DeleteSessionRequest {
            session_id: session_id.to_string(),
        };
        let req = HttpRequest::post_json(self.url("/api/admin/chat-history/"), &body)?
            .with_csrf(self.csrf());
        self.ack(req).await
    }

    pub async fn notifications(&self) -> Result<NotificationsResponse, ApiError> {
        let resp = self
            .http
            .send(HttpRequest::get(self.url("/api/notifications/")))
            .await?;
        let body: NotificationsResponse = resp.ok_json()?;
        if body.success {
            Ok(body)
        } else {
            Err(ApiError::rejected(None))
        }
    }

    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<Ack, ApiError> {
        let req = HttpRequest::post_json(
            self.url("/api/notifications/"),
            &MarkReadRequest { notification_id },
        )?;
        let resp = self.http.send(req).await?;
        let ack: Ack = resp.ok_json()?;
        if ack.success {
            Ok(ack)
        } else {
            Err(ApiError::rejected(ack.error))
        }
    }

    /// `None` when the server decides no alert is warranted.
    pub async fn temperature_alert(
        &self,
        request: &TemperatureAlertRequest,
    ) -> Result<Option<TemperatureAlert>, ApiError> {
        let req = HttpRequest::post_json(self.url("/api/temperature-alert/"), request)?;
        let body: TemperatureAlertResponse = self.http.send(req).await?.json()?;
        if body.success {
            Ok(body.alert)
        } else {
            Err(ApiError::rejected(body.error))
        }
    }

    pub async fn dismiss_alert(&self) -> Result<(), ApiError> {
        let req = HttpRequest::post_empty(self.url("/api/dismiss-alert/"));
        self.http.send(req).await?;
        Ok(())
    }

    pub async fn send_weather_alert(&self, alert: &WeatherAlertRequest) -> Result<Ack, ApiError> {
        let req = HttpRequest::post_json(self.url("/api/admin/send-weather-alert/"), alert)?
            .with_csrf(self.csrf());
        self.ack(req).await
    }

    pub async fn admin_user(&self, user_id: i64) -> Result<AdminUser, ApiError> {
        let url = self.url(&format!("/admin-users/{user_id}/"));
        let body: AdminUserResponse = self.http.send(HttpRequest::get(url)).await?.json()?;
        match body.user {
            Some(user) if body.success => Ok(user),
            _ => Err(ApiError::rejected(body.error)),
        }
    }

    pub async fn edit_admin_user(&self, user_id: i64, form: &UserEditForm) -> Result<Ack, ApiError> {
        let req = HttpRequest::post_json(self.url(&format!("/admin-users/{user_id}/edit/")), form)?
            .with_csrf(self.csrf());
        self.ack(req).await
    }

    pub async fn delete_admin_user(&self, user_id: i64) -> Result<Ack, ApiError> {
        let req = HttpRequest::post_empty(self.url(&format!("/admin-users/{user_id}/delete/")))
            .with_csrf(self.csrf());
        self.ack(req).await
    }
}
