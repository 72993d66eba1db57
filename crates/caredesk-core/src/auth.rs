use caredesk_api::{ApiClient, Credentials};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::forms::is_valid_email;
use crate::session::{Session, SessionContext, SessionFile, ViewKind};
use crate::{Error, Result, ValidationErrors};

/// The only writer of the session context
#[derive(Debug, Clone)]
pub struct Authenticator {
    context: SessionContext,
    file: Option<SessionFile>,
    valid_for_days: i64,
}

impl Authenticator {
    pub fn new(context: SessionContext, settings: &SessionConfig) -> Self {
        Self {
            context,
            file: None,
            valid_for_days: settings.valid_for_days,
        }
    }

    /// Persist sessions to `file` between runs
    pub fn with_file(mut self, file: SessionFile) -> Self {
        self.file = Some(file);
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Sign in and point `client` at the new token
    pub async fn login(&self, client: &mut ApiClient, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        let mut errors = ValidationErrors::new();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address");
        }
        if password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()?;

        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = client.login(&credentials).await?;
        let session = Session::new(response.token, response.user, self.valid_for_days);

        if let Some(file) = &self.file {
            file.save(&session)?;
        }
        client.set_token(Some(session.token.clone()));
        self.context.set(session.clone());

        info!("Signed in as {} ({})", session.display_name(), session.role);
        Ok(session)
    }

    pub fn logout(&self, client: &mut ApiClient) -> Result<()> {
        if let Some(file) = &self.file {
            file.remove()?;
        }
        client.set_token(None);
        self.context.clear();
        info!("Signed out");
        Ok(())
    }

    /// Pick up a saved, unexpired session if there is one
    pub fn restore(&self, client: &mut ApiClient) -> Option<Session> {
        let session = self.file.as_ref()?.load()?;
        debug!(
            "Restored session for {} ({} days left)",
            session.display_name(),
            session.days_remaining()
        );
        client.set_token(Some(session.token.clone()));
        self.context.set(session.clone());
        Some(session)
    }

    /// The current session, provided its role may open `view`
    pub fn require(&self, view: ViewKind) -> Result<Session> {
        let session = self.context.current().ok_or(Error::Unauthenticated)?;
        if !session.role.can_access(view) {
            return Err(Error::Forbidden {
                role: session.role.to_string(),
                view: view.to_string(),
            });
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use caredesk_api::ApiError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authenticator(dir: &tempfile::TempDir) -> Authenticator {
        Authenticator::new(SessionContext::new(), &SessionConfig::default())
            .with_file(SessionFile::new(dir.path().join("session.json")))
    }

    #[tokio::test]
    async fn test_login_sets_context_and_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"email": "meron@ngo.org", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "abc",
                "user": {"id": 3, "name": "Meron", "role": "manager"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let auth = authenticator(&dir);
        let mut client = ApiClient::new(server.uri()).unwrap();

        let session = auth.login(&mut client, " meron@ngo.org ", "pw").await.unwrap();
        assert_eq!(session.role, Role::Manager);
        assert!(client.has_token());
        assert_eq!(auth.context().token().as_deref(), Some("abc"));

        assert!(auth.require(ViewKind::Sponsors).is_ok());
        assert!(matches!(
            auth.require(ViewKind::Employees),
            Err(Error::Forbidden { .. })
        ));

        // a fresh process picks the session back up
        let again = authenticator(&dir);
        let mut fresh = ApiClient::new(server.uri()).unwrap();
        assert_eq!(again.restore(&mut fresh).map(|s| s.token), Some("abc".to_string()));
        assert!(fresh.has_token());

        again.logout(&mut fresh).unwrap();
        assert!(!again.context().is_authenticated());
        assert!(!fresh.has_token());
        assert!(authenticator(&dir).restore(&mut fresh).is_none());
    }

    #[tokio::test]
    async fn test_invalid_input_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let auth = authenticator(&dir);
        let mut client = ApiClient::new(server.uri()).unwrap();

        match auth.login(&mut client, "not-an-email", "").await {
            Err(Error::Validation(errors)) => {
                assert!(errors.get("email").is_some());
                assert!(errors.get("password").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_login_leaves_context_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let auth = authenticator(&dir);
        let mut client = ApiClient::new(server.uri()).unwrap();

        let err = auth.login(&mut client, "a@b.org", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Api(ApiError::Http { status: 401, ref message }) if message == "Invalid credentials"
        ));
        assert!(!auth.context().is_authenticated());
        assert!(matches!(auth.require(ViewKind::Beneficiaries), Err(Error::Unauthenticated)));
    }
}
