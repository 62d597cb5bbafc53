use crate::boundary::{FocusCallback, HostElement};
use crate::error::Result;
use crate::hotkey::{Handlers, HotKeyMap, SequenceHandler};
use crate::matcher::Matcher;
use crate::target::{AttachTarget, ElementRef};
use std::rc::Rc;

/// Declarative configuration of one scope.
///
/// Exactly one of [`attach`](Self::attach), [`attach_ref`](Self::attach_ref)
/// or [`bind_to_boundary`](Self::bind_to_boundary) must be chosen.
pub struct ScopeConfig<M: Matcher> {
    pub(crate) name: String,
    pub(crate) key_map: HotKeyMap,
    pub(crate) handlers: Handlers<M::Event>,
    pub(crate) focused: Option<bool>,
    pub(crate) host: HostElement,
    pub(crate) on_focus: Option<FocusCallback>,
    pub(crate) on_blur: Option<FocusCallback>,
    attach: Option<M::Element>,
    attach_ref: Option<ElementRef<M::Element>>,
    bind_to_boundary: bool,
}

impl<M: Matcher> ScopeConfig<M> {
    pub fn new() -> Self {
        Self {
            name: "scope".to_string(),
            key_map: HotKeyMap::new(),
            handlers: Handlers::new(),
            focused: None,
            host: HostElement::default(),
            on_focus: None,
            on_blur: None,
            attach: None,
            attach_ref: None,
            bind_to_boundary: false,
        }
    }

    /// Label used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn key_map(mut self, key_map: HotKeyMap) -> Self {
        self.key_map = key_map;
        self
    }

    pub fn handlers(mut self, handlers: Handlers<M::Event>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn handler(mut self, name: impl Into<String>, handler: SequenceHandler<M::Event>) -> Self {
        self.handlers.insert(name, handler);
        self
    }

    /// Force the effective focus instead of observing focus and blur.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = Some(focused);
        self
    }

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

    pub fn attach(mut self, element: M::Element) -> Self {
        self.attach = Some(element);
        self
    }

    pub fn attach_ref(mut self, reference: ElementRef<M::Element>) -> Self {
        self.attach_ref = Some(reference);
        self
    }

    pub fn bind_to_boundary(mut self) -> Self {
        self.bind_to_boundary = true;
        self
    }

    pub(crate) fn target(&self) -> Result<AttachTarget<M::Element>> {
        AttachTarget::from_sources(
            self.attach.clone(),
            self.attach_ref.clone(),
            self.bind_to_boundary,
        )
    }
}

impl<M: Matcher> Default for ScopeConfig<M> {
    fn default() -> Self {
        Self::new()
    }
}
