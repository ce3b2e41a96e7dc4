/// Site adapter subsystem
///
/// Everything between raw page content and structured fields lives here:
/// compiled selectors, per-site adapters, the constructor factory, and the
/// adaptive parser that dispatches between them.
pub mod factory;
pub mod parser;
pub mod selector;
pub mod site;

pub use factory::{AdapterConstructor, AdapterFactory};
pub use parser::AdaptiveParser;
pub use selector::{CompiledSelector, PostProcess};
pub use site::{AdapterKind, SiteAdapter};
