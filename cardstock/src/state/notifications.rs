//! Error-notification store
//!
//! Failures are data, keyed by an operation-specific id so repeated
//! failures of the same kind replace rather than accumulate.

/// A user-visible error.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorNotification {
    /// Operation-specific id, e.g. `fetch-sources`.
    pub id: String,
    /// Short human-readable title.
    pub name: String,
    /// Optional detail.
    pub message: Option<String>,
}

/// Ordered list of error notifications.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationsState {
    pub errors: Vec<ErrorNotification>,
}

impl NotificationsState {
    /// Report an error; an existing notification with the same id is
    /// replaced in place.
    pub fn report(&mut self, notification: ErrorNotification) -> bool {
        if let Some(existing) = self.errors.iter_mut().find(|e| e.id == notification.id) {
            if *existing == notification {
                return false;
            }
            *existing = notification;
        } else {
            self.errors.push(notification);
        }
        true
    }

    /// Dismiss the notification with the given id.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.errors.len();
        self.errors.retain(|e| e.id != id);
        self.errors.len() != before
    }

    /// Dismiss everything.
    pub fn clear(&mut self) -> bool {
        if self.errors.is_empty() {
            return false;
        }
        self.errors.clear();
        true
    }

    /// The notification with the given id, if present.
    pub fn get(&self, id: &str) -> Option<&ErrorNotification> {
        self.errors.iter().find(|e| e.id == id)
    }
}
