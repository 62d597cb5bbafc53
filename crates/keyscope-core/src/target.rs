//! Where a scope's matcher instance listens.

use crate::boundary::FocusBoundary;
use crate::error::{Result, ScopeError};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A reference to an element that is filled in after mount.
pub struct ElementRef<El> {
    slot: Rc<RefCell<Option<El>>>,
}

impl<El> ElementRef<El> {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set(&self, element: El) {
        *self.slot.borrow_mut() = Some(element);
    }

    pub fn clear(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn get(&self) -> Option<El>
    where
        El: Clone,
    {
        self.slot.borrow().clone()
    }

    pub fn same_ref(&self, other: &ElementRef<El>) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<El> Clone for ElementRef<El> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<El> Default for ElementRef<El> {
    fn default() -> Self {
        Self::new()
    }
}

impl<El: fmt::Debug> fmt::Debug for ElementRef<El> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementRef").field(&self.slot.borrow()).finish()
    }
}

/// The single configured bind target source of a scope.
#[derive(Clone, Debug)]
pub enum AttachTarget<El> {
    /// A concrete element or the window.
    Element(El),
    /// An element reference resolved at mount time.
    Ref(ElementRef<El>),
    /// The scope's own focus boundary.
    Boundary,
}

impl<El: PartialEq> PartialEq for AttachTarget<El> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttachTarget::Element(a), AttachTarget::Element(b)) => a == b,
            (AttachTarget::Ref(a), AttachTarget::Ref(b)) => a.same_ref(b),
            (AttachTarget::Boundary, AttachTarget::Boundary) => true,
            _ => false,
        }
    }
}

impl<El> AttachTarget<El> {
    /// Validate that exactly one target source was supplied.
    pub fn from_sources(
        attach: Option<El>,
        attach_ref: Option<ElementRef<El>>,
        boundary: bool,
    ) -> Result<Self> {
        match (attach, attach_ref, boundary) {
            (Some(element), None, false) => Ok(AttachTarget::Element(element)),
            (None, Some(reference), false) => Ok(AttachTarget::Ref(reference)),
            (None, None, true) => Ok(AttachTarget::Boundary),
            (None, None, false) => Err(ScopeError::Configuration(
                "no bind target: supply one of attach, attach_ref or bind_to_boundary".to_string(),
            )),
            _ => Err(ScopeError::Configuration(
                "ambiguous bind target: attach, attach_ref and bind_to_boundary are mutually exclusive"
                    .to_string(),
            )),
        }
    }

    /// Resolve into what the matcher binds to.
    pub fn resolve(&self, boundary: &FocusBoundary) -> Result<BindTarget<El>>
    where
        El: Clone,
    {
        match self {
            AttachTarget::Element(element) => Ok(BindTarget::Element(element.clone())),
            AttachTarget::Ref(reference) => reference.get().map(BindTarget::Element).ok_or_else(|| {
                ScopeError::Configuration("attach_ref has not been resolved to an element".to_string())
            }),
            AttachTarget::Boundary => Ok(BindTarget::Boundary(boundary.clone())),
        }
    }
}

/// A resolved target handed to [`Matcher::bind`](crate::Matcher::bind).
#[derive(Clone, Debug)]
pub enum BindTarget<El> {
    Element(El),
    Boundary(FocusBoundary),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_source_is_accepted() {
        assert_eq!(
            AttachTarget::from_sources(Some(1), None, false).unwrap(),
            AttachTarget::Element(1)
        );
        assert!(matches!(
            AttachTarget::<i32>::from_sources(None, Some(ElementRef::new()), false),
            Ok(AttachTarget::Ref(_))
        ));
        assert_eq!(
            AttachTarget::<i32>::from_sources(None, None, true).unwrap(),
            AttachTarget::Boundary
        );
    }

    #[test]
    fn missing_or_ambiguous_sources_are_rejected() {
        let none = AttachTarget::<i32>::from_sources(None, None, false).unwrap_err();
        assert!(none.to_string().contains("no bind target"));

        let both = AttachTarget::from_sources(Some(1), Some(ElementRef::new()), false).unwrap_err();
        assert!(both.to_string().contains("ambiguous"));

        let with_boundary = AttachTarget::from_sources(Some(1), None, true).unwrap_err();
        assert!(matches!(with_boundary, ScopeError::Configuration(_)));
    }

    #[test]
    fn unresolved_ref_fails_to_resolve() {
        let reference = ElementRef::new();
        let target = AttachTarget::Ref(reference.clone());
        let boundary = FocusBoundary::new();
        assert!(matches!(
            target.resolve(&boundary),
            Err(ScopeError::Configuration(_))
        ));

        reference.set(7);
        assert!(matches!(target.resolve(&boundary), Ok(BindTarget::Element(7))));
    }
}
