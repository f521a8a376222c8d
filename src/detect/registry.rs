use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::detect::result::Detection;
use crate::frame::Frame;

use super::backend::DetectorBackend;

/// Thread-safe registry of detector backends.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<Mutex<dyn DetectorBackend>>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    fn default_backend(&self) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.default_name
            .as_ref()
            .and_then(|name| self.backends.get(name).cloned())
    }

    /// List registered backends, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Warm up every registered backend.
    pub fn warm_up_all(&self) -> Result<()> {
        for (name, backend) in &self.backends {
            let mut guard = backend
                .lock()
                .map_err(|_| anyhow!("backend '{}' lock poisoned", name))?;
            guard.warm_up()?;
        }
        Ok(())
    }

    /// Run the default backend on a frame.
    pub fn detect(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no detector backend registered"))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned"))?;
        guard.detect(frame)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::StubBackend;
    use crate::detect::Detection;

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new());
        assert_eq!(registry.default_name(), Some("stub"));
        assert_eq!(registry.list(), vec!["stub".to_string()]);
    }

    #[test]
    fn later_registrations_keep_the_first_default() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new());
        registry.register(crate::detect::ReplayBackend::from_lines("[]\n"));
        assert_eq!(registry.default_name(), Some("stub"));
        assert_eq!(registry.list(), vec!["replay".to_string(), "stub".to_string()]);
    }

    #[test]
    fn detect_uses_default_backend() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::repeating(vec![Detection::centered_at(
            5, 5, 2, 0.9, 2,
        )]));
        let frame = Frame::solid(1, 16, 16, [0, 0, 0]);
        let hits = registry.detect(&frame).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn detect_without_backends_fails() {
        let registry = BackendRegistry::new();
        let frame = Frame::solid(1, 4, 4, [0, 0, 0]);
        assert!(registry.detect(&frame).is_err());
    }
}
