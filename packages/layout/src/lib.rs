//! # Scriptory Layout
//!
//! Page-aware formatting: measures blocks with their template style, breaks
//! them onto pages with keep-together and orphan/widow rules, and inserts
//! MORE / CONT'D markers where dialogue crosses a page boundary.
//!
//! Layout is derived data. It is computed from an immutable
//! [`scriptory_document::TreeSnapshot`], can be recomputed incrementally
//! from the first edited block, and can run on a background worker that
//! abandons stale generations.

mod cancel;
mod errors;
pub mod export;
mod layout;
pub mod measure;
mod paginator;
mod units;
mod worker;

pub use cancel::{CancelToken, Generation};
pub use errors::LayoutError;
pub use export::{render_text, styled_blocks, StyledBlock};
pub use layout::{
    template_fingerprint, FlowPosition, Fragment, FragmentReason, OverflowWarning, Page,
    PageLayout,
};
pub use measure::{MonospaceMeasurer, TextMeasurer};
pub use paginator::{paginate, recompute_from, Paginator};
pub use units::{speaker_name, MeasuredUnit};
pub use worker::{LayoutJob, LayoutWorker, PublishedLayout};
