/// Router Module Index
///
/// Routes are split by access level; the authentication layer is applied to
/// the whole `authenticated` router in `create_router`, not per handler.

/// Routes accessible without a caller identity.
pub mod public;

/// Routes behind the `AuthUser` gate.
pub mod authenticated;
