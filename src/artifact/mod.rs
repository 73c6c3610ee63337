//! Artifact lifecycle.
//!
//! Artifacts are the output images written to the static directory. This
//! module names them, stores them, finds them again for chained operations
//! and prunes old ones per family.
//!
//! # Layout
//!
//! ```text
//! static/
//!   resize_64x64_1700000000_3f9a0c1d2b4e.jpg
//!   sharpen_-10_64x64_1700000007_91be00aa7c21.jpg
//!   converted_64x64_1700000012_0d1e2f3a4b5c.webp
//!   enhanced_30_64x64_1700000020_77aa0c9e1f02.png
//! ```
//!
//! There is no index: discovery is by name prefix and modification time.

mod naming;
mod retention;
mod store;

pub use naming::{content_digest, unix_now, ArtifactFamily, ArtifactName, DIGEST_LEN};
pub use retention::{latest, prune, PruneReport};
pub use store::ArtifactStore;
