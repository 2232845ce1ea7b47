//! Pagination
//!
//! [`PageRequest::extract`] validates the raw `page`/`size` parameters and
//! [`paginate`] slices a loaded collection into a [`Page`].

pub mod page;
pub mod request;

pub use page::{paginate, Page, PageRequest};
pub use request::ParamSource;
