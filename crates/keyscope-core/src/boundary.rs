//! Programmatically focusable wrapper around a scope's content.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tab order of every boundary: focusable from code, skipped by Tab navigation.
pub const BOUNDARY_TAB_INDEX: i32 = -1;

static NEXT_BOUNDARY_ID: AtomicU64 = AtomicU64::new(1);

pub type FocusCallback = Rc<dyn Fn()>;

/// Identity of a mounted boundary node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundaryId(u64);

impl BoundaryId {
    fn next() -> Self {
        BoundaryId(NEXT_BOUNDARY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boundary#{}", self.0)
    }
}

/// Element or component type a boundary renders as.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HostElement {
    /// Generic container.
    #[default]
    Container,
    Named(String),
}

impl HostElement {
    pub fn name(&self) -> &str {
        match self {
            HostElement::Container => "container",
            HostElement::Named(name) => name,
        }
    }
}

struct BoundaryInner {
    id: BoundaryId,
    host: HostElement,
    on_focus: Option<FocusCallback>,
    on_blur: Option<FocusCallback>,
}

/// Structural wrapper that forwards focus and blur to its owner unmodified.
///
/// Clones share identity and callbacks, so a host can keep a clone to
/// deliver focus changes while the owning scope keeps its own.
#[derive(Clone)]
pub struct FocusBoundary {
    inner: Rc<BoundaryInner>,
}

impl FocusBoundary {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> FocusBoundaryBuilder {
        FocusBoundaryBuilder::default()
    }

    pub fn id(&self) -> BoundaryId {
        self.inner.id
    }

    pub fn host(&self) -> &HostElement {
        &self.inner.host
    }

    pub fn tab_index(&self) -> i32 {
        BOUNDARY_TAB_INDEX
    }

    /// Deliver a focus notification.
    pub fn focus(&self) {
        if let Some(on_focus) = &self.inner.on_focus {
            on_focus();
        }
    }

    /// Deliver a blur notification.
    pub fn blur(&self) {
        if let Some(on_blur) = &self.inner.on_blur {
            on_blur();
        }
    }

    pub fn same_node(&self, other: &FocusBoundary) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Default for FocusBoundary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FocusBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusBoundary")
            .field("id", &self.inner.id)
            .field("host", &self.inner.host)
            .field("tab_index", &BOUNDARY_TAB_INDEX)
            .finish()
    }
}

#[derive(Default)]
pub struct FocusBoundaryBuilder {
    host: HostElement,
    on_focus: Option<FocusCallback>,
    on_blur: Option<FocusCallback>,
}

impl FocusBoundaryBuilder {
    pub fn host(mut self, host: HostElement) -> Self {
        self.host = host;
        self
    }

    pub fn on_focus(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_focus = Some(Rc::new(callback));
        self
    }

    pub fn on_blur(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_blur = Some(Rc::new(callback));
        self
    }

    pub fn build(self) -> FocusBoundary {
        FocusBoundary {
            inner: Rc::new(BoundaryInner {
                id: BoundaryId::next(),
                host: self.host,
                on_focus: self.on_focus,
                on_blur: self.on_blur,
            }),
        }
    }
}
