//! Cache record store.
//!
//! Each original asset owns one slot in the cache directory, named after its
//! [`AssetId`]. A slot is in one of three states:
//!
//! - **absent**: never decided;
//! - **sentinel**: `<id>.state` holds an 8-character [`Sentinel`]
//!   (`00000000`, `YYYYMMDD` or `YYYYMM00`);
//! - **optimized**: `<id>.<ext>` holds the optimized bytes, served verbatim.
//!
//! Sentinels and payloads live in different files, so the payload size never
//! has to double as a type tag; an optimized image of exactly eight bytes is
//! stored and served like any other.
//!
//! [`InFlight`] provides the per-identity lock the engine holds while it
//! decides, so concurrent first requests for one asset share a single remote
//! attempt.

mod flight;
mod record;
mod store;

pub use flight::InFlight;
pub use record::{AssetId, SENTINEL_LEN, Sentinel};
pub use store::{RecordStore, StoredRecord};
