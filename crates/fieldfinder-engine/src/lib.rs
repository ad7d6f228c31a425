//! Interactive region search: polygon drawing, proximity and containment
//! search, saved regions, selection with bulk contact, and alerts.

pub mod alerts;
pub mod drawing;
pub mod error;
pub mod geolocation;
pub mod kv;
pub mod notice;
pub mod regions;
pub mod search;
pub mod selection;
pub mod session;
pub mod surface;

pub use alerts::AlertManager;
pub use drawing::{DrawInput, DrawOutcome, DrawPhase, DrawingController};
pub use error::{AlertError, RegionError};
pub use geolocation::{locate, FixedPosition, GeolocationError, GeolocationProvider};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use notice::{Notice, NoticeLevel};
pub use regions::{RegionListing, RegionStore, StorageDamage, REGIONS_KEY};
pub use search::{
    evaluate, ResultKey, SearchController, SearchMode, SearchOutcome, SearchRequest,
    SearchResultItem, SearchResults, SourceFailure,
};
pub use selection::{bulk_contact, BulkContactReport, ContactFailure, Selection};
pub use session::SearchSession;
pub use surface::{
    ListenerId, ListenerKind, MapSurface, MemorySurface, Overlay, OverlayId, PointerHandler,
    ShapeEventKind, ShapeHandler,
};
