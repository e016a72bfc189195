//! Route keys.

/// The three kinds of webhook the relay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookKind {
    /// A Task's status changed.
    TaskStatus,
    /// A Version's status changed.
    VersionStatus,
    /// A Version was created.
    VersionCreated,
}

impl WebhookKind {
    /// Resolves a route key (already lower-cased by the caller or not).
    ///
    /// Returns `None` for unknown keys, which the listener answers with 404.
    pub fn from_route_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "task" => Some(Self::TaskStatus),
            "version" | "status" => Some(Self::VersionStatus),
            "version_created" | "version-created" => Some(Self::VersionCreated),
            _ => None,
        }
    }

    /// Canonical route key, used in logs and for the legacy endpoints.
    pub fn route_key(self) -> &'static str {
        match self {
            Self::TaskStatus => "task",
            Self::VersionStatus => "version",
            Self::VersionCreated => "version_created",
        }
    }
}

impl std::fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.route_key())
    }
}
