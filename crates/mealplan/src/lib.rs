mod api;
mod model;
mod registry;
mod session;
mod view;

pub use api::*;
pub use model::*;
pub use registry::*;
pub use session::*;
pub use view::*;

cfg_if::cfg_if! {
    if #[cfg(any(test, feature = "memory"))] {
        mod memory;

        pub use memory::*;
    }
}
