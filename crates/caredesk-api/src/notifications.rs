use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry in the notifications dropdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<NotificationKind>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// What triggered the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewRequest,       // A beneficiary request was submitted
    RequestDecision,  // A request was approved or rejected
    Reassignment,     // A beneficiary needs a new sponsor
    ReportUploaded,
    Payment,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::NewRequest => write!(f, "New Request"),
            NotificationKind::RequestDecision => write!(f, "Request Decision"),
            NotificationKind::Reassignment => write!(f, "Reassignment"),
            NotificationKind::ReportUploaded => write!(f, "Report"),
            NotificationKind::Payment => write!(f, "Payment"),
            NotificationKind::Other => write!(f, "Other"),
        }
    }
}

/// Filters for the notifications dropdown
#[derive(Debug, Clone, Default)]
pub struct NotificationFilters {
    /// Only show unread notifications
    pub unread_only: bool,
    /// Only show one kind
    pub kind: Option<NotificationKind>,
    /// Cap on how many entries to show
    pub limit: Option<usize>,
}

impl NotificationFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unread_only(mut self) -> Self {
        self.unread_only = true;
        self
    }

    pub fn kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, notification: &Notification) -> bool {
        if self.unread_only && notification.read {
            return false;
        }
        match self.kind {
            Some(kind) => notification.kind == Some(kind),
            None => true,
        }
    }

    /// Apply the filters, newest first
    pub fn apply(&self, notifications: Vec<Notification>) -> Vec<Notification> {
        let mut kept: Vec<_> = notifications
            .into_iter()
            .filter(|n| self.matches(n))
            .collect();
        // None sorts last under the reversed comparison
        kept.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = self.limit {
            kept.truncate(limit);
        }
        kept
    }
}

/// Badge count for the dropdown
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn note(id: u64, read: bool, kind: NotificationKind, day: u32) -> Notification {
        Notification {
            id,
            title: Some(format!("note {}", id)),
            message: None,
            kind: Some(kind),
            read,
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_unread_filter_and_ordering() {
        let notes = vec![
            note(1, false, NotificationKind::NewRequest, 1),
            note(2, true, NotificationKind::Payment, 2),
            note(3, false, NotificationKind::Payment, 3),
        ];

        let shown = NotificationFilters::new().unread_only().apply(notes.clone());
        let ids: Vec<u64> = shown.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(unread_count(&notes), 2);
    }

    #[test]
    fn test_kind_filter_with_limit() {
        let notes = vec![
            note(1, false, NotificationKind::Payment, 1),
            note(2, false, NotificationKind::Payment, 2),
            note(3, false, NotificationKind::Reassignment, 3),
        ];

        let shown = NotificationFilters::new()
            .kind(NotificationKind::Payment)
            .limit(1)
            .apply(notes);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, 2);
    }

    #[test]
    fn test_unknown_kind_deserializes_as_other() {
        let n: Notification =
            serde_json::from_str(r#"{"id": 9, "type": "brand_new_kind"}"#).unwrap();
        assert_eq!(n.kind, Some(NotificationKind::Other));
        assert!(!n.read);
    }
}
