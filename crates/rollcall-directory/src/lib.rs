//! Token directory client for the Rollcall kiosk.
//!
//! The scan resolution engine never owns credential data. It asks a
//! [`TokenDirectory`] for the entry matching a scanned token and classifies
//! whatever comes back. This crate defines that seam and ships
//! [`InMemoryDirectory`], used by tests, demos and offline kiosks seeded from
//! a JSON export.

pub mod error;
pub mod memory;
pub mod seed;

pub use error::{DirectoryError, DirectoryResult};
pub use memory::InMemoryDirectory;
pub use seed::{SeedFile, SeedRecord};

use rollcall_core::{DirectoryEntry, Token};
use std::future::Future;
use std::sync::Arc;

/// Read-only lookup of credentials by token.
///
/// Lookups are keyed by the token value alone; the channel a token arrived
/// on never takes part. Implementations must not cache on behalf of the
/// caller: every call reflects the directory's current contents.
///
/// The returned future is `Send` so the kiosk session task can hold it
/// across its select loop.
///
/// # Examples
///
/// ```
/// use rollcall_core::{DirectoryEntry, EntityId, EntityKind, Token};
/// use rollcall_directory::{InMemoryDirectory, TokenDirectory};
///
/// #[tokio::main]
/// async fn main() -> rollcall_directory::DirectoryResult<()> {
///     let token = Token::new("qr_011").unwrap();
///     let directory = InMemoryDirectory::new();
///     directory.insert(DirectoryEntry::active(
///         token.clone(),
///         EntityKind::Student,
///         EntityId::new(11),
///     ));
///
///     let entry = directory.lookup(&token).await?;
///     assert_eq!(entry.map(|e| e.entity_id), Some(EntityId::new(11)));
///     Ok(())
/// }
/// ```
pub trait TokenDirectory: Send + Sync {
    /// Find the entry for `token`, or `None` if the directory has none.
    fn lookup(
        &self,
        token: &Token,
    ) -> impl Future<Output = DirectoryResult<Option<DirectoryEntry>>> + Send;
}

impl<D: TokenDirectory> TokenDirectory for Arc<D> {
    fn lookup(
        &self,
        token: &Token,
    ) -> impl Future<Output = DirectoryResult<Option<DirectoryEntry>>> + Send {
        D::lookup(self, token)
    }
}
