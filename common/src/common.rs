use std::hash::BuildHasherDefault;
use wyhash::WyHash;

/// Slot index of a node in the manager's arena.
pub type NodeId = usize;
/// Identity of a variable, invariant across reorderings.
pub type VarIndex = usize;
/// Position of a variable in the current order, 0 = topmost.
pub type Level = usize;
/// Handle returned when a hook is registered.
pub type HookId = usize;

pub type DdHashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<WyHash>>;
pub type DdHashSet<T> = hashbrown::HashSet<T, BuildHasherDefault<WyHash>>;
