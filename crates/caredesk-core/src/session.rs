use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use caredesk_api::SessionUser;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Access level of a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::Unknown => "unknown",
        }
    }

    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("admin") | Some("administrator") => Role::Admin,
            Some("manager") => Role::Manager,
            Some("staff") | Some("employee") => Role::Staff,
            _ => Role::Unknown,
        }
    }

    /// Which screens each role gets on its dashboard
    pub fn can_access(self, view: ViewKind) -> bool {
        match self {
            Role::Admin => true,
            Role::Manager => view != ViewKind::Employees,
            Role::Staff => matches!(
                view,
                ViewKind::Beneficiaries | ViewKind::Guardians | ViewKind::Requests | ViewKind::Reports
            ),
            Role::Unknown => false,
        }
    }

    pub fn accessible_views(self) -> Vec<ViewKind> {
        ViewKind::all()
            .into_iter()
            .filter(|v| self.can_access(*v))
            .collect()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The screens of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Beneficiaries,
    Sponsors,
    Guardians,
    Employees,
    Requests,
    Reports,
    Sms,
}

impl ViewKind {
    pub fn all() -> Vec<ViewKind> {
        vec![
            ViewKind::Beneficiaries,
            ViewKind::Sponsors,
            ViewKind::Guardians,
            ViewKind::Employees,
            ViewKind::Requests,
            ViewKind::Reports,
            ViewKind::Sms,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewKind::Beneficiaries => "Beneficiaries",
            ViewKind::Sponsors => "Sponsors",
            ViewKind::Guardians => "Guardians",
            ViewKind::Employees => "Employees",
            ViewKind::Requests => "Requests",
            ViewKind::Reports => "Reports",
            ViewKind::Sms => "SMS",
        }
    }
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
    pub role: Role,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String, user: SessionUser, valid_for_days: i64) -> Self {
        let started_at = Utc::now();
        let role = Role::from_raw(user.role.as_deref());
        Self {
            token,
            user,
            role,
            started_at,
            expires_at: started_at + Duration::days(valid_for_days),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn days_remaining(&self) -> i64 {
        (self.expires_at - Utc::now()).num_days().max(0)
    }

    pub fn display_name(&self) -> &str {
        self.user
            .name
            .as_deref()
            .or(self.user.email.as_deref())
            .unwrap_or("unknown user")
    }
}

/// Process-wide view of who is signed in
///
/// Any view may read it. Only the login and logout flows in `auth` write it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<Session>>>,
}

static GLOBAL_SESSION: OnceLock<SessionContext> = OnceLock::new();

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared context, created on first use
    pub fn global() -> &'static SessionContext {
        GLOBAL_SESSION.get_or_init(SessionContext::new)
    }

    pub fn current(&self) -> Option<Session> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().filter(|s| !s.is_expired()).cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.current().map(|s| s.role)
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub(crate) fn set(&self, session: Session) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(session);
    }

    pub(crate) fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

/// Session persisted between CLI runs
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/caredesk/session.json`
    pub fn default_location() -> crate::Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::Config("Could not find data directory".into()))?
            .join("caredesk");
        Ok(Self::new(dir.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a saved session; expired or unreadable sessions are treated as absent
    pub fn load(&self) -> Option<Session> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Session>(&contents) {
            Ok(session) if session.is_expired() => {
                debug!("Saved session expired at {}", session.expires_at);
                None
            }
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    pub fn remove(&self) -> crate::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> SessionUser {
        SessionUser {
            id: 1,
            name: Some("Meron".into()),
            email: None,
            role: Some(role.into()),
        }
    }

    #[test]
    fn test_role_access() {
        assert!(Role::Admin.can_access(ViewKind::Employees));
        assert!(!Role::Manager.can_access(ViewKind::Employees));
        assert!(Role::Manager.can_access(ViewKind::Sms));
        assert!(Role::Staff.can_access(ViewKind::Guardians));
        assert!(!Role::Staff.can_access(ViewKind::Sponsors));
        assert!(Role::Unknown.accessible_views().is_empty());
        assert_eq!(Role::from_raw(Some(" Admin ")), Role::Admin);
        assert_eq!(Role::from_raw(None), Role::Unknown);
    }

    #[test]
    fn test_context_set_and_clear() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_authenticated());

        ctx.set(Session::new("tok".into(), user("manager"), 30));
        assert_eq!(ctx.role(), Some(Role::Manager));
        assert_eq!(ctx.token().as_deref(), Some("tok"));

        // clones share state
        let other = ctx.clone();
        other.clear();
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn test_expired_session_is_not_current() {
        let ctx = SessionContext::new();
        ctx.set(Session::new("tok".into(), user("admin"), 0));
        assert!(ctx.current().is_none());
    }

    #[test]
    fn test_session_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));
        assert!(file.load().is_none());

        let session = Session::new("tok".into(), user("staff"), 7);
        file.save(&session).unwrap();
        assert_eq!(file.load(), Some(session));

        file.remove().unwrap();
        assert!(file.load().is_none());
        // removing twice is fine
        file.remove().unwrap();
    }

    #[test]
    fn test_expired_session_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        file.save(&Session::new("tok".into(), user("staff"), 0)).unwrap();
        assert!(file.load().is_none());
    }
}
