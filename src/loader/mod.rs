pub mod page;

pub use page::{LoadError, PageLoader, WebPageLoader};
