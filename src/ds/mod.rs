pub mod intrusive_list;
pub mod mru_list;
pub mod slot_arena;

pub use intrusive_list::IntrusiveList;
pub use mru_list::{MruIter, MruLifecycle, MruList, MruNode};
pub use slot_arena::{SlotArena, SlotId};
