// ── Persistence ──
//
// A JSON-file backed dataset plus a change-tracking session per
// editing context.

mod database;
mod session;

pub use database::{Database, Dataset};
pub use session::TrackedRepository;
