// Tue Jan 15 2026 - Alex

pub mod alignment;
pub mod bindings;
pub mod cache;
pub mod engine;
pub mod layout;

pub use alignment::Alignment;
pub use cache::{InstanceKey, LayoutCache};
pub use engine::{apply_explicit_offsets, apply_layout, LayoutEngine};
pub use layout::{MemberLayout, RecordLayout};
