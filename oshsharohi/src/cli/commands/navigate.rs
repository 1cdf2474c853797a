//! `navigate`: plays one link click against a recording surface.

use std::sync::Arc;

use chrono::Utc;

use crate::cli::args::NavigateArgs;
use crate::error::OshsharohiError;
use crate::navigation::{ActiveLinks, LinkClick, NavigationController};
use crate::observability::{Event, EventEmitter};
use crate::surface::{RecordingNavigator, RecordingSurface};

use super::load_config;

/// Intercepts a click on `href`, waits for the transition and prints what
/// happened: the rendered instructions as one event, then any navigation.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub async fn run(args: &NavigateArgs) -> Result<(), OshsharohiError> {
    let config = load_config(args.config.as_deref())?;
    let surface = Arc::new(RecordingSurface::permissive());
    let navigator = Arc::new(RecordingNavigator::at(&args.current));
    let events = Arc::new(EventEmitter::stdout());

    let controller = NavigationController::new(
        config.navigation,
        surface.clone(),
        navigator.clone(),
        ActiveLinks::default(),
    )
    .with_events(Arc::clone(&events));

    let outcome = controller.intercept(&LinkClick::new("clicked-link", &args.href))?;
    if let Some(handle) = outcome.handle() {
        handle.completed().await;
    }

    events.emit(Event::Rendered {
        timestamp: Utc::now(),
        instructions: surface.instructions(),
    });
    for (_, href) in navigator.visits() {
        println!("navigated to {href}");
    }
    if !outcome.prevents_default() {
        println!("not intercepted; default link action proceeds");
    }
    Ok(())
}
