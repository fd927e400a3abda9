use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    View,
    Edit,
    MoreApps,
}

impl Page {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view" | "view_profile" => Some(Self::View),
            "edit" | "edit_profile" => Some(Self::Edit),
            "moreApps" | "more_apps" => Some(Self::MoreApps),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::MoreApps => "moreApps",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { euid: i64, page: Option<Page> },
}

impl SessionState {
    pub fn phase(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated { page: None, .. } => "authenticated",
            Self::Authenticated {
                page: Some(Page::View),
                ..
            } => "viewing",
            Self::Authenticated {
                page: Some(Page::Edit),
                ..
            } => "editing",
            Self::Authenticated {
                page: Some(Page::MoreApps),
                ..
            } => "moreApps",
        }
    }

    pub fn euid(self) -> Option<i64> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { euid, .. } => Some(euid),
        }
    }

    pub fn page(self) -> Option<Page> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { page, .. } => page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    NotAuthenticated,
    AlreadyAuthenticated,
}

impl TransitionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::AlreadyAuthenticated => "already_authenticated",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "log in first",
            Self::AlreadyAuthenticated => "session is already logged in",
        }
    }
}

/// Per-session state machine. Pages replace each other; they never stack.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: SessionState::Anonymous,
        }
    }
}

impl Session {
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Call only after the credentials were accepted.
    pub fn login(&mut self, euid: i64) -> Result<(), TransitionError> {
        if let SessionState::Authenticated { .. } = self.state {
            return Err(TransitionError::AlreadyAuthenticated);
        }
        self.state = SessionState::Authenticated { euid, page: None };
        Ok(())
    }

    pub fn logout(&mut self) {
        self.state = SessionState::Anonymous;
    }

    pub fn select_page(&mut self, page: Page) -> Result<(), TransitionError> {
        match &mut self.state {
            SessionState::Anonymous => Err(TransitionError::NotAuthenticated),
            SessionState::Authenticated { page: current, .. } => {
                *current = Some(page);
                Ok(())
            }
        }
    }

    pub fn require_euid(&self) -> Result<i64, TransitionError> {
        self.state.euid().ok_or(TransitionError::NotAuthenticated)
    }
}

/// In-memory sessions; nothing survives a restart.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    /// Creates a fresh anonymous session and returns its id.
    pub fn open(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), Session::default());
        id
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Unknown ids read as anonymous.
    pub fn state_of(&self, id: &str) -> SessionState {
        self.sessions
            .get(id)
            .map(|s| s.state())
            .unwrap_or(SessionState::Anonymous)
    }

    /// Logging out discards the session entirely.
    pub fn close(&mut self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some(mut s) => {
                s.logout();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
