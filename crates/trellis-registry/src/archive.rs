//! One registration unit of beans and observers.

use crate::bean::{Bean, Observer};

/// A bean archive: the registration target for one module's beans.
///
/// Open while the scanner and extensions feed it, then closed before any
/// resolution happens. Registering into a closed archive is a programmer
/// error in the container, not a user error, and panics.
#[derive(Debug, Default)]
pub struct BeanArchive {
    name: String,
    beans: Vec<Bean>,
    observers: Vec<Observer>,
    closed: bool,
}

impl BeanArchive {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            beans: Vec::new(),
            observers: Vec::new(),
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duplicate type/qualifier combinations are allowed here; ambiguity is
    /// a resolution-time concern.
    pub fn register(&mut self, bean: Bean) {
        assert!(!self.closed, "bean registered into a closed archive");
        tracing::trace!(archive = %self.name, class = bean.bean_class.0, "registering bean");
        self.beans.push(bean);
    }

    pub fn register_observer(&mut self, observer: Observer) {
        assert!(!self.closed, "observer registered into a closed archive");
        self.observers.push(observer);
    }

    /// Freeze the archive. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn beans(&self) -> &[Bean] {
        &self.beans
    }

    pub fn observers(&self) -> &[Observer] {
        &self.observers
    }

    pub(crate) fn into_parts(self) -> (Vec<Bean>, Vec<Observer>) {
        (self.beans, self.observers)
    }
}
