pub use common;
pub use ddcore;

pub mod prelude {
    pub use ddcore::prelude::*;
}
