pub mod common;
pub mod nodes;

pub mod prelude {
    pub use crate::common::{DdHashMap, DdHashSet};
    pub use crate::common::{HookId, Level, NodeId, VarIndex};
    pub use crate::nodes::{DDForest, NonTerminal, Terminal};
}
