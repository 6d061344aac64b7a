use common::prelude::*;

use crate::manager::DdManager;

/// The four hook chains.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HookType {
    PreGc,
    PostGc,
    PreReordering,
    PostReordering,
}

/// A hook receives the manager and a short label naming the trigger and
/// reports success. A failing hook aborts the triggering operation.
pub type HookFn = Box<dyn Fn(&DdManager, &str) -> bool>;

impl DdManager {
    /// Appends `f` to the chain and returns a handle for removal.
    pub fn add_hook(&mut self, kind: HookType, f: HookFn) -> HookId {
        let id = self.next_hook_id;
        self.next_hook_id += 1;
        self.hooks[kind as usize].push((id, f));
        id
    }

    /// Removes the hook registered under `id`; reports whether it was found.
    pub fn remove_hook(&mut self, kind: HookType, id: HookId) -> bool {
        let chain = &mut self.hooks[kind as usize];
        let before = chain.len();
        chain.retain(|(h, _)| *h != id);
        chain.len() != before
    }

    pub fn is_in_hook(&self, kind: HookType, id: HookId) -> bool {
        self.hooks[kind as usize].iter().any(|(h, _)| *h == id)
    }

    /// Runs one chain in registration order; stops at the first failure.
    /// Hooks must not re-enter the manager, which the shared borrow enforces.
    pub(crate) fn run_hooks(&mut self, kind: HookType, label: &str) -> bool {
        if self.hooks[kind as usize].is_empty() {
            return true;
        }
        let chain = std::mem::take(&mut self.hooks[kind as usize]);
        let mut ok = true;
        for (_, f) in chain.iter() {
            if !f(self, label) {
                ok = false;
                break;
            }
        }
        self.hooks[kind as usize] = chain;
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn add_remove_is_in() {
        let mut dd = DdManager::default();
        let id = dd.add_hook(HookType::PreGc, Box::new(|_, _| true));
        assert!(dd.is_in_hook(HookType::PreGc, id));
        assert!(!dd.is_in_hook(HookType::PostGc, id));
        assert!(dd.remove_hook(HookType::PreGc, id));
        assert!(!dd.remove_hook(HookType::PreGc, id));
    }

    #[test]
    fn gc_runs_hooks_in_order() {
        let mut dd = DdManager::init(2, 0, 16, 64, 0);
        let log = Rc::new(Cell::new(0u32));
        let pre = log.clone();
        dd.add_hook(
            HookType::PreGc,
            Box::new(move |_, label| {
                assert_eq!(label, "DD");
                pre.set(pre.get() * 10 + 1);
                true
            }),
        );
        let post = log.clone();
        dd.add_hook(
            HookType::PostGc,
            Box::new(move |_, _| {
                post.set(post.get() * 10 + 2);
                true
            }),
        );
        dd.garbage_collect();
        assert_eq!(log.get(), 12);
    }

    #[test]
    fn failing_hook_reports_internal_error() {
        use crate::manager::ErrorCode;
        let mut dd = DdManager::init(2, 0, 16, 64, 0);
        dd.add_hook(HookType::PreGc, Box::new(|_, _| false));
        dd.garbage_collect();
        assert_eq!(dd.read_error_code(), ErrorCode::InternalError);
    }
}
