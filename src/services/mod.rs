//! Services layer - Business logic
//!
//! This module contains the blog's read and write operations. Services are
//! responsible for:
//! - Normalizing identifiers before they reach the data service
//! - Turning raw rows into display-ready shapes
//! - Applying each operation's failure policy: fail-fast operations log and
//!   return the service error unchanged, best-effort ones log and degrade

pub mod comment;
pub mod post;
pub mod stats;
pub mod tag;

pub use comment::CommentService;
pub use post::{PostService, DEFAULT_FEATURED_LIMIT};
pub use stats::StatsService;
pub use tag::{get_tags_from_posts, NameCollator, TagService};
