//! Page names, link classification and the active nav marker.

use crate::surface::{ElementId, RenderInstruction};

/// Page served for an empty path.
pub const INDEX_PAGE: &str = "index.html";

/// Link targets that also mean the home page.
pub const HOME_ALIASES: [&str; 3] = [INDEX_PAGE, "./", "/"];

/// Class marking the current page's nav link.
pub const ACTIVE_CLASS: &str = "active";

/// File name of the page at `path`, without query or fragment.
///
/// `/about/team.html?x=1#top` is `team.html`; `/` is `index.html`.
#[must_use]
pub fn resolve_page(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(page) if !page.is_empty() => page,
        _ => INDEX_PAGE,
    }
}

/// How a clicked link is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Another site or a non-page resource; left to the browser
    External,
    /// `#section` on the current page
    Fragment,
    /// A `.html` page of this site
    Page,
}

/// Classifies `href`. Internal pages end with `.html` and are not absolute
/// `http` URLs.
#[must_use]
pub fn classify(href: &str) -> LinkKind {
    if href.starts_with('#') {
        LinkKind::Fragment
    } else if href.ends_with(".html") && !href.starts_with("http") {
        LinkKind::Page
    } else {
        LinkKind::External
    }
}

/// Whether a page link to `href` points at `current_page`.
#[must_use]
pub fn is_same_page(current_page: &str, href: &str) -> bool {
    resolve_page(current_page) == resolve_page(href)
}

/// A candidate for the active marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub element: ElementId,
    pub href: String,
}

impl NavLink {
    #[must_use]
    pub fn new(element: impl Into<ElementId>, href: &str) -> Self {
        Self {
            element: element.into(),
            href: href.to_owned(),
        }
    }
}

/// Nav links (desktop and mobile) sharing one active marker.
#[derive(Debug, Clone, Default)]
pub struct ActiveLinks {
    links: Vec<NavLink>,
}

impl ActiveLinks {
    #[must_use]
    pub const fn new(links: Vec<NavLink>) -> Self {
        Self { links }
    }

    #[must_use]
    pub fn links(&self) -> &[NavLink] {
        &self.links
    }

    fn clear(&self) -> impl Iterator<Item = RenderInstruction> + '_ {
        self.links
            .iter()
            .map(|l| RenderInstruction::remove_class(&l.element, ACTIVE_CLASS))
    }

    /// Clears every candidate, then marks `link`.
    #[must_use]
    pub fn mark(&self, link: &ElementId) -> Vec<RenderInstruction> {
        self.clear()
            .chain(std::iter::once(RenderInstruction::add_class(link, ACTIVE_CLASS)))
            .collect()
    }

    /// Initial highlighting for `page`: links whose href is the page, plus
    /// the home aliases when on the index page.
    #[must_use]
    pub fn sync_to_page(&self, page: &str) -> Vec<RenderInstruction> {
        let page = resolve_page(page);
        let on_home = page == INDEX_PAGE;
        let matching = self.links.iter().filter(|l| {
            l.href == page || (on_home && HOME_ALIASES.contains(&l.href.as_str()))
        });
        self.clear()
            .chain(matching.map(|l| RenderInstruction::add_class(&l.element, ACTIVE_CLASS)))
            .collect()
    }
}
