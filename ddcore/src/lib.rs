pub mod add_ops;
pub mod bdd_abs;
pub mod bdd_approx;
pub mod bdd_compose;
pub mod bdd_gencof;
pub mod bdd_ops;
pub mod cache;
pub mod count;
pub mod edge;
pub mod gens;
pub mod hooks;
pub mod manager;
pub mod node;
pub mod reorder;
pub mod reorder_anneal;
pub mod reorder_exact;
pub mod reorder_genetic;
pub mod reorder_group;
pub mod reorder_window;
pub mod unique;

pub mod prelude {
    pub use common::prelude::*;

    pub use crate::add_ops::AddOp;
    pub use crate::bdd_ops::IteConst;
    pub use crate::cache::Operation;
    pub use crate::edge::Edge;
    pub use crate::gens::{CubeGen, NodeGen, PrimeGen, DONT_CARE};
    pub use crate::hooks::{HookFn, HookType};
    pub use crate::manager::{DdManager, ErrorCode, GroupCheck, CACHE_SLOTS, UNIQUE_SLOTS};
    pub use crate::node::{ConstantNode, Node, NonTerminalBdd};
    pub use crate::reorder::ReorderMethod;
    pub use crate::reorder_group::{GroupNode, GroupTree};
}
