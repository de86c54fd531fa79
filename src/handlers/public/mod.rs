// handlers/public/mod.rs - Handlers reachable from both contexts
//
// `/` and `/health` answer for the public site and, after prefix stripping,
// for every tenant. `/signup` only answers in the public context.

pub mod health; // GET /health
pub mod home;   // GET /
pub mod signup; // POST /signup

pub use health::health;
pub use home::home;
pub use signup::signup;
