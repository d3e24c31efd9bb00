/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The four modules map directly to the access gate's requirements:
/// anonymous, any authenticated role, `author`, `admin`.

/// Routes accessible to all users (anonymous, read-only, plus the login gateway).
pub mod public;

/// Routes protected by the authentication stage of the access gate.
/// Requires a verified token and a resolvable identity, any role.
pub mod authenticated;

/// Routes restricted to users with the 'author' role (admins pass).
pub mod author;

/// Routes restricted exclusively to users with the 'admin' role.
pub mod admin;
