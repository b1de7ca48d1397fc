//! Domain types for the GeoBrent analysis engine

pub mod change_point;
pub mod event;
pub mod impact;
pub mod price;

pub use change_point::{ChangePoint, ChangeType, Regime};
pub use event::{EventType, GeoEvent, ImpactLevel, RawEvent};
pub use impact::{Anchor, AnchorId, ImpactAnalysis, Significance};
pub use price::{DerivedPoint, PricePoint, PriceRow};
