mod priority_shared_mutex;

pub use priority_shared_mutex::{
    PrioritySharedExclusiveGuard, PrioritySharedMutex, PrioritySharedReadGuard,
};
