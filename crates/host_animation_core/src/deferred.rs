use std::{
    cell::RefCell,
    fmt,
    mem,
    rc::{Rc, Weak},
};

use crate::errors::AnimationError;

/// Terminal (or not yet terminal) outcome of a [`Deferred`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DeferredStatus {
    #[default]
    Pending,
    Resolved,
    Rejected(AnimationError),
    /// Pre-empted. Awaiting code treats this like a resolution, but it is not one.
    Canceled,
}

impl DeferredStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, DeferredStatus::Pending)
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }
}

type Executable = Box<dyn FnMut(&Deferred, f32)>;
type Hook = Box<dyn FnOnce(&DeferredStatus)>;

#[derive(Default)]
struct DeferredInner {
    status: DeferredStatus,
    executable: Option<Executable>,
    hooks: Vec<Hook>,
    /// Deferreds that receive this one's cancellation or rejection
    linked: Vec<Deferred>,
}

/// A manually stepped, cancelable unit of future work.
///
/// There is no scheduler behind a `Deferred`: whoever owns the work calls [`Deferred::execute`]
/// once per frame with the frame's delta time, and the stored executable decides when to
/// resolve, reject or cancel. Clones share the same underlying state, so the owner can keep
/// driving the work while callers hold on to a handle and observe the outcome.
///
/// Exactly one terminal status is ever reached; every later `resolve`, `reject` or `cancel`
/// call is ignored.
#[derive(Clone, Default)]
pub struct Deferred(Rc<RefCell<DeferredInner>>);

impl Deferred {
    /// Creates a pending deferred without an executable. It only settles through explicit
    /// calls to [`resolve`](Self::resolve), [`reject`](Self::reject) or
    /// [`cancel`](Self::cancel).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a deferred and invokes `executable` once, synchronously, with a delta of `0`.
    ///
    /// While the deferred stays pending, every call to [`execute`](Self::execute) re-enters the
    /// same executable with fresh arguments.
    pub fn with_executable(executable: impl FnMut(&Deferred, f32) + 'static) -> Self {
        let deferred = Self::new();
        deferred.0.borrow_mut().executable = Some(Box::new(executable));
        deferred.execute(0.);
        deferred
    }

    pub fn resolved() -> Self {
        let deferred = Self::new();
        deferred.resolve();
        deferred
    }

    pub fn rejected(error: AnimationError) -> Self {
        let deferred = Self::new();
        deferred.reject(error);
        deferred
    }

    pub fn canceled() -> Self {
        let deferred = Self::new();
        deferred.cancel();
        deferred
    }

    pub fn status(&self) -> DeferredStatus {
        self.0.borrow().status.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.0.borrow().status.is_pending()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.0.borrow().status, DeferredStatus::Resolved)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.0.borrow().status, DeferredStatus::Rejected(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self.0.borrow().status, DeferredStatus::Canceled)
    }

    /// The rejection reason, if this deferred was rejected.
    pub fn error(&self) -> Option<AnimationError> {
        match &self.0.borrow().status {
            DeferredStatus::Rejected(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Returns `true` if this call settled the deferred.
    pub fn resolve(&self) -> bool {
        self.settle(DeferredStatus::Resolved)
    }

    /// Returns `true` if this call settled the deferred.
    pub fn reject(&self, error: AnimationError) -> bool {
        self.settle(DeferredStatus::Rejected(error))
    }

    /// Returns `true` if this call settled the deferred.
    pub fn cancel(&self) -> bool {
        self.settle(DeferredStatus::Canceled)
    }

    /// Re-enters the stored executable with `delta`. Does nothing once settled or when there is
    /// no executable.
    pub fn execute(&self, delta: f32) {
        let executable = {
            let mut inner = self.0.borrow_mut();
            if inner.status.is_settled() {
                return;
            }
            inner.executable.take()
        };
        let Some(mut executable) = executable else {
            return;
        };

        executable(self, delta);

        let mut inner = self.0.borrow_mut();
        if inner.status.is_pending() && inner.executable.is_none() {
            inner.executable = Some(executable);
        }
    }

    /// Registers a callback run with the terminal status. Runs immediately if already settled.
    pub fn on_settle(&self, hook: impl FnOnce(&DeferredStatus) + 'static) {
        let status = {
            let mut inner = self.0.borrow_mut();
            if inner.status.is_pending() {
                inner.hooks.push(Box::new(hook));
                return;
            }
            inner.status.clone()
        };
        hook(&status);
    }

    pub fn on_resolve(&self, hook: impl FnOnce() + 'static) {
        self.on_settle(move |status| {
            if matches!(status, DeferredStatus::Resolved) {
                hook();
            }
        });
    }

    pub fn on_reject(&self, hook: impl FnOnce(&AnimationError) + 'static) {
        self.on_settle(move |status| {
            if let DeferredStatus::Rejected(error) = status {
                hook(error);
            }
        });
    }

    pub fn on_cancel(&self, hook: impl FnOnce() + 'static) {
        self.on_settle(move |status| {
            if matches!(status, DeferredStatus::Canceled) {
                hook();
            }
        });
    }

    /// Combines `deferreds` into one that resolves once every element has resolved.
    ///
    /// If any element is canceled or rejected first, the combined deferred settles the same way
    /// and the cancellation or rejection is forwarded to every element still pending. Canceling
    /// or rejecting the combined deferred directly fans out the same way.
    pub fn all(deferreds: impl IntoIterator<Item = Deferred>) -> Deferred {
        let combined = Deferred::new();
        let children: Vec<Deferred> = deferreds.into_iter().collect();
        combined.0.borrow_mut().linked = children.clone();

        for child in &children {
            let weak: Weak<RefCell<DeferredInner>> = Rc::downgrade(&combined.0);
            child.on_settle(move |status| {
                if let Some(inner) = weak.upgrade() {
                    Deferred(inner).child_settled(status);
                }
            });
            if combined.0.borrow().status.is_settled() {
                break;
            }
        }

        combined.resolve_if_children_resolved();
        combined
    }

    /// Creates a fresh deferred that settles the same way as this one.
    ///
    /// Settling the follower never reaches back into this deferred, so followers can be
    /// combined with [`all`](Self::all) without linking independent work together.
    pub fn follower(&self) -> Deferred {
        let follower = Deferred::new();
        let weak = Rc::downgrade(&follower.0);
        self.on_settle(move |status| {
            if let Some(inner) = weak.upgrade() {
                Deferred(inner).settle(status.clone());
            }
        });
        follower
    }

    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn child_settled(&self, status: &DeferredStatus) {
        match status {
            DeferredStatus::Canceled => {
                self.cancel();
            }
            DeferredStatus::Rejected(error) => {
                self.reject(error.clone());
            }
            DeferredStatus::Resolved => self.resolve_if_children_resolved(),
            DeferredStatus::Pending => {}
        }
    }

    fn resolve_if_children_resolved(&self) {
        let all_resolved = {
            let inner = self.0.borrow();
            inner.status.is_pending() && inner.linked.iter().all(Deferred::is_resolved)
        };
        if all_resolved {
            self.resolve();
        }
    }

    fn settle(&self, status: DeferredStatus) -> bool {
        let (hooks, linked, executable) = {
            let mut inner = self.0.borrow_mut();
            if inner.status.is_settled() {
                return false;
            }
            inner.status = status.clone();
            (
                mem::take(&mut inner.hooks),
                mem::take(&mut inner.linked),
                inner.executable.take(),
            )
        };
        drop(executable);

        match &status {
            DeferredStatus::Canceled => {
                for deferred in &linked {
                    deferred.cancel();
                }
            }
            DeferredStatus::Rejected(error) => {
                for deferred in &linked {
                    deferred.reject(error.clone());
                }
            }
            DeferredStatus::Resolved | DeferredStatus::Pending => {}
        }

        for hook in hooks {
            hook(&status);
        }

        true
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(inner) => f
                .debug_struct("Deferred")
                .field("status", &inner.status)
                .finish(),
            Err(_) => f.debug_struct("Deferred").finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn first_terminal_status_wins() {
        let deferred = Deferred::new();
        assert!(deferred.resolve());
        assert!(!deferred.reject(AnimationError::MissingLayer("Base".into())));
        assert!(!deferred.cancel());
        assert_eq!(deferred.status(), DeferredStatus::Resolved);

        let deferred = Deferred::new();
        deferred.cancel();
        deferred.resolve();
        assert!(deferred.is_canceled());
        assert!(!deferred.is_resolved());
    }

    #[test]
    fn executable_runs_on_construction_and_on_execute() {
        let calls = Rc::new(Cell::new(0));
        let elapsed = Rc::new(Cell::new(0.));

        let deferred = {
            let calls = calls.clone();
            let elapsed = elapsed.clone();
            Deferred::with_executable(move |deferred, delta| {
                calls.set(calls.get() + 1);
                elapsed.set(elapsed.get() + delta);
                if elapsed.get() >= 100. {
                    deferred.resolve();
                }
            })
        };
        assert_eq!(calls.get(), 1);
        assert!(deferred.is_pending());

        deferred.execute(60.);
        assert!(deferred.is_pending());
        deferred.execute(60.);
        assert!(deferred.is_resolved());
        assert_eq!(calls.get(), 3);

        deferred.execute(60.);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn hooks_fire_once_and_late_hooks_fire_immediately() {
        let resolved = Rc::new(Cell::new(0));
        let canceled = Rc::new(Cell::new(false));

        let deferred = Deferred::new();
        {
            let resolved = resolved.clone();
            deferred.on_resolve(move || resolved.set(resolved.get() + 1));
        }
        {
            let canceled = canceled.clone();
            deferred.on_cancel(move || canceled.set(true));
        }

        deferred.resolve();
        deferred.resolve();
        assert_eq!(resolved.get(), 1);
        assert!(!canceled.get());

        let late = Rc::new(Cell::new(false));
        {
            let late = late.clone();
            deferred.on_resolve(move || late.set(true));
        }
        assert!(late.get());
    }

    #[test]
    fn all_resolves_when_every_element_resolves() {
        let a = Deferred::new();
        let b = Deferred::new();
        let combined = Deferred::all([a.clone(), b.clone()]);

        a.resolve();
        assert!(combined.is_pending());
        b.resolve();
        assert!(combined.is_resolved());
    }

    #[test]
    fn all_of_nothing_is_resolved() {
        assert!(Deferred::all(Vec::new()).is_resolved());
    }

    #[test]
    fn cancel_in_all_fans_out_to_siblings() {
        let a = Deferred::new();
        let b = Deferred::new();
        let c = Deferred::new();
        c.resolve();
        let combined = Deferred::all([a.clone(), b.clone(), c.clone()]);

        a.cancel();
        assert!(combined.is_canceled());
        assert!(b.is_canceled());
        assert!(c.is_resolved());
    }

    #[test]
    fn reject_in_all_fans_out_to_siblings() {
        let a = Deferred::new();
        let b = Deferred::new();
        let combined = Deferred::all([a.clone(), b.clone()]);

        b.reject(AnimationError::EmptyQueue("q".into()));
        assert_eq!(combined.error(), Some(AnimationError::EmptyQueue("q".into())));
        assert!(a.is_rejected());
    }

    #[test]
    fn canceling_all_cancels_pending_elements() {
        let a = Deferred::new();
        let b = Deferred::resolved();
        let combined = Deferred::all([a.clone(), b.clone()]);

        combined.cancel();
        assert!(a.is_canceled());
        assert!(b.is_resolved());
    }

    #[test]
    fn all_over_already_canceled_element_is_canceled() {
        let a = Deferred::canceled();
        let b = Deferred::new();
        let combined = Deferred::all([a, b.clone()]);

        assert!(combined.is_canceled());
        assert!(b.is_canceled());
    }

    #[test]
    fn follower_mirrors_without_linking_back() {
        let source = Deferred::new();
        let follower = source.follower();
        source.resolve();
        assert!(follower.is_resolved());

        let a = Deferred::new();
        let b = Deferred::new();
        let combined = Deferred::all([a.follower(), b.follower()]);

        a.cancel();
        assert!(combined.is_canceled());
        assert!(b.is_pending());

        let settled = Deferred::canceled().follower();
        assert!(settled.is_canceled());
    }
}
