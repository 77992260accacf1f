//! Trial-deletion cycle collector.
//!
//! 1. Snapshot every registered object's reference count into `gc_refs`.
//! 2. Subtract one for every reference held by another registered object.
//!    What remains counts references from outside the heap (stacks,
//!    namespaces, native code).
//! 3. Objects with positive `gc_refs`, and everything they reach, survive.
//! 4. The rest are garbage. All garbage bodies are emptied before any
//!    object is released, so no destructor re-enters an object that is
//!    also being destroyed.

use rustc_hash::FxHashMap;

use super::{GcBody, Heap};

impl Heap {
    /// Run a full collection. Returns the number of objects destroyed.
    pub fn collect(&mut self) -> usize {
        let lock = self.lock.clone();
        let mut guard = lock.as_ref().map(super::GlobalLock::lock);

        let pruned = self.prune();
        let objects = self.live_objects();
        let position: FxHashMap<u32, usize> = objects
            .iter()
            .enumerate()
            .map(|(i, g)| (g.handle().index, i))
            .collect();

        // `objects` holds one strong reference to each object.
        let mut gc_refs: Vec<usize> = objects.iter().map(|g| g.strong_count() - 1).collect();
        // An object whose body is borrowed right now is in use: keep it.
        let mut pinned = vec![false; objects.len()];

        for (i, obj) in objects.iter().enumerate() {
            let Ok(body) = obj.try_body() else {
                pinned[i] = true;
                continue;
            };
            body.for_each_child(&mut |child| {
                if let Some(&j) = position.get(&child.handle().index) {
                    if objects[j].ptr_eq(child) {
                        gc_refs[j] = gc_refs[j].saturating_sub(1);
                    }
                }
            });
        }

        // Survivors: externally referenced objects and everything they reach.
        let mut survivor = vec![false; objects.len()];
        let mut work: Vec<usize> = (0..objects.len())
            .filter(|&i| gc_refs[i] > 0 || pinned[i])
            .collect();
        for &i in &work {
            survivor[i] = true;
        }
        while let Some(i) = work.pop() {
            let Ok(body) = objects[i].try_body() else {
                continue;
            };
            body.for_each_child(&mut |child| {
                if let Some(&j) = position.get(&child.handle().index) {
                    if !survivor[j] && objects[j].ptr_eq(child) {
                        survivor[j] = true;
                        work.push(j);
                    }
                }
            });
        }

        // Sweep: empty every garbage body first, then release.
        let mut bodies = Vec::new();
        for (i, obj) in objects.iter().enumerate() {
            if !survivor[i] {
                if let Ok(mut body) = obj.try_body_mut() {
                    bodies.push(std::mem::replace(&mut *body, GcBody::Cleared));
                }
            }
        }
        let freed = bodies.len();
        drop(bodies);
        drop(objects);
        let dead = self.prune();

        if let Some(g) = guard.as_mut() {
            g.live_objects = g.live_objects.saturating_sub(pruned + dead);
            g.collections += 1;
        }
        tracing::debug!(freed, live = self.registered, "cycle collection");
        freed
    }
}
