use repochat_logging::{repochat_info, repochat_warn};

use crate::{Effect, Transition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Currently known projects. Duplicates are kept as delivered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectDirectory {
    projects: Vec<Project>,
    in_flight: usize,
    error: Option<String>,
}

impl ProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// True while at least one refresh has not completed.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Issues one directory request. Overlapping refreshes are not
    /// coalesced; whichever completes last wins.
    pub fn refresh(&mut self) -> Transition {
        self.in_flight += 1;
        Transition::changed().with_effect(Effect::FetchProjects)
    }

    pub fn apply(&mut self, result: Result<Vec<Project>, String>) -> Transition {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(projects) => {
                repochat_info!("Directory refreshed with {} projects", projects.len());
                self.projects = projects;
                self.error = None;
            }
            Err(reason) => {
                repochat_warn!("Directory refresh failed: {}", reason);
                self.error = Some(reason);
            }
        }
        Transition::changed()
    }
}
