use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;
use tracing::debug;

use crate::routes::RouteTree;

pub type NavParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("unknown route: {0}")]
    UnknownRoute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub name: String,
    pub params: NavParams,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, name: &str, params: NavParams) -> Result<(), NavigationError>;
    /// Returns `false` when there is nowhere to go back to.
    fn go_back(&self) -> bool;
}

/// History stack addressed by route names from a [`RouteTree`].
pub struct RouteNavigator {
    routes: RouteTree,
    history: Mutex<Vec<NavEntry>>,
}

impl RouteNavigator {
    pub fn new(routes: RouteTree) -> Self {
        Self {
            routes,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn routes(&self) -> &RouteTree {
        &self.routes
    }

    pub fn current(&self) -> Option<NavEntry> {
        self.history().last().cloned()
    }

    pub fn depth(&self) -> usize {
        self.history().len()
    }

    fn history(&self) -> MutexGuard<'_, Vec<NavEntry>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for RouteNavigator {
    fn navigate(&self, name: &str, params: NavParams) -> Result<(), NavigationError> {
        if self.routes.find(name).is_none() {
            return Err(NavigationError::UnknownRoute(name.to_string()));
        }
        debug!(route = name, "navigate");
        self.history().push(NavEntry {
            name: name.to_string(),
            params,
        });
        Ok(())
    }

    fn go_back(&self) -> bool {
        let mut history = self.history();
        if history.len() < 2 {
            return false;
        }
        history.pop();
        true
    }
}
