//! Mobile menu, member modal and department accordion.
//!
//! Each overlay tracks its own open state and answers input with the
//! instructions to apply. The menu and the modal lock page scroll while
//! open.

use crate::surface::{ElementId, RenderInstruction};

pub const MENU_BUTTON: &str = "mobileMenuBtn";
pub const MENU: &str = "mobileMenu";
pub const MODAL: &str = "memberModal";
pub const MODAL_PHOTO: &str = "modalPhoto";
pub const MODAL_NAME: &str = "modalName";
pub const MODAL_ROLE: &str = "modalRole";
pub const MODAL_DEPT: &str = "modalDept";

/// Role shown for members without one.
pub const DEFAULT_ROLE: &str = "Team Member";

const ACTIVE: &str = "active";
const EXPANDED: &str = "expanded";
const BODY: &str = "body";

fn scroll_lock(locked: bool) -> RenderInstruction {
    RenderInstruction::set_style(BODY, "overflow", if locked { "hidden" } else { "" })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MobileMenu {
    open: bool,
}

impl MobileMenu {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    fn set(&mut self, open: bool) -> Vec<RenderInstruction> {
        self.open = open;
        let class = |target: &str| {
            if open {
                RenderInstruction::add_class(target, ACTIVE)
            } else {
                RenderInstruction::remove_class(target, ACTIVE)
            }
        };
        vec![class(MENU_BUTTON), class(MENU), scroll_lock(open)]
    }

    /// Menu button clicked.
    pub fn toggle(&mut self) -> Vec<RenderInstruction> {
        self.set(!self.open)
    }

    /// A link inside the menu was followed.
    pub fn close(&mut self) -> Vec<RenderInstruction> {
        self.set(false)
    }

    /// Escape pressed; nothing happens while closed.
    pub fn escape(&mut self) -> Vec<RenderInstruction> {
        if self.open { self.close() } else { Vec::new() }
    }
}

/// What a member card shows. Missing parts leave the modal's field as is,
/// except the role, which falls back to [`DEFAULT_ROLE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberCard {
    pub photo: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberModal {
    open: bool,
}

impl MemberModal {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self, card: &MemberCard) -> Vec<RenderInstruction> {
        let mut out = Vec::new();
        if let Some(photo) = &card.photo {
            out.push(RenderInstruction::SetAttribute {
                target: ElementId::new(MODAL_PHOTO),
                name: "src".to_string(),
                value: photo.clone(),
            });
        }
        if let Some(name) = &card.name {
            out.push(RenderInstruction::SetAttribute {
                target: ElementId::new(MODAL_PHOTO),
                name: "alt".to_string(),
                value: name.clone(),
            });
            out.push(RenderInstruction::set_text(MODAL_NAME, name));
        }
        out.push(RenderInstruction::set_text(
            MODAL_ROLE,
            card.role.as_deref().unwrap_or(DEFAULT_ROLE),
        ));
        if let Some(dept) = &card.department {
            out.push(RenderInstruction::set_text(MODAL_DEPT, dept));
        }
        out.push(RenderInstruction::add_class(MODAL, ACTIVE));
        out.push(scroll_lock(true));
        self.open = true;
        out
    }

    /// Close button or backdrop clicked.
    pub fn close(&mut self) -> Vec<RenderInstruction> {
        self.open = false;
        vec![RenderInstruction::remove_class(MODAL, ACTIVE), scroll_lock(false)]
    }

    pub fn escape(&mut self) -> Vec<RenderInstruction> {
        if self.open { self.close() } else { Vec::new() }
    }
}

/// Expandable departments; at most one is open.
#[derive(Debug, Clone, Default)]
pub struct DepartmentAccordion {
    departments: Vec<ElementId>,
    expanded: Option<usize>,
}

impl DepartmentAccordion {
    #[must_use]
    pub const fn new(departments: Vec<ElementId>) -> Self {
        Self {
            departments,
            expanded: None,
        }
    }

    #[must_use]
    pub const fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    /// Header of department `index` clicked: collapses the others and
    /// toggles this one. Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) -> Vec<RenderInstruction> {
        let Some(target) = self.departments.get(index) else {
            return Vec::new();
        };
        let opening = self.expanded != Some(index);
        let mut out: Vec<_> = self
            .departments
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, d)| RenderInstruction::remove_class(d, EXPANDED))
            .collect();
        out.push(if opening {
            RenderInstruction::add_class(target, EXPANDED)
        } else {
            RenderInstruction::remove_class(target, EXPANDED)
        });
        self.expanded = opening.then_some(index);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, Surface};

    #[test]
    fn test_menu_toggle_locks_scroll() {
        let surface = RecordingSurface::permissive();
        let mut menu = MobileMenu::default();
        surface.apply_all(menu.toggle());
        assert!(menu.is_open());
        assert!(surface.has_class(MENU, "active"));
        assert_eq!(surface.style("body", "overflow").as_deref(), Some("hidden"));

        surface.apply_all(menu.escape());
        assert!(!surface.has_class(MENU_BUTTON, "active"));
        assert_eq!(surface.style("body", "overflow").as_deref(), Some(""));
        assert!(menu.escape().is_empty());
    }

    #[test]
    fn test_modal_role_fallback() {
        let surface = RecordingSurface::permissive();
        let mut modal = MemberModal::default();
        surface.apply_all(modal.open(&MemberCard {
            name: Some("Rafi".into()),
            department: Some("Powertrain".into()),
            ..MemberCard::default()
        }));
        assert_eq!(surface.text(MODAL_NAME).as_deref(), Some("Rafi"));
        assert_eq!(surface.text(MODAL_ROLE).as_deref(), Some(DEFAULT_ROLE));
        assert_eq!(surface.text(MODAL_DEPT).as_deref(), Some("Powertrain"));
        assert!(surface.has_class(MODAL, "active"));

        surface.apply_all(modal.escape());
        assert!(!modal.is_open());
        assert!(!surface.has_class(MODAL, "active"));
    }

    #[test]
    fn test_accordion_single_open() {
        let surface = RecordingSurface::permissive();
        let mut acc =
            DepartmentAccordion::new(vec!["dept-a".into(), "dept-b".into(), "dept-c".into()]);
        surface.apply_all(acc.toggle(0));
        surface.apply_all(acc.toggle(2));
        assert!(!surface.has_class("dept-a", "expanded"));
        assert!(surface.has_class("dept-c", "expanded"));
        assert_eq!(acc.expanded(), Some(2));

        surface.apply_all(acc.toggle(2));
        assert!(!surface.has_class("dept-c", "expanded"));
        assert_eq!(acc.expanded(), None);
        assert!(acc.toggle(9).is_empty());
    }
}
