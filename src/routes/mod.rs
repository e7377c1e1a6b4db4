//! Routers segregated by access level. Access control is attached where each
//! router is merged in `create_router`, never inside the handlers' routing.

/// Unauthenticated API routes: health and the session exchange.
pub mod public;

/// API routes resolved through the `AuthUser` extractor. Role checks for
/// club, parent and talent-seeker actions happen in the handlers.
pub mod authenticated;

/// Moderation API, restricted to the ADMIN role.
pub mod admin;

/// Role-gated dashboard groups, wrapped in the page guard.
pub mod dashboards;

/// Demo account switcher, wrapped in the demo gate.
pub mod demo;
