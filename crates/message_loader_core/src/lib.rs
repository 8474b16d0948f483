//! Message loader core: target discovery model, grouping and the pure run state machine.
mod element;
mod group;
mod messages;
mod state;
mod update;

pub use element::{
    is_valid_element, ElementError, MarkedNode, Markers, TargetElement, GROUP_ATTRIBUTE,
    SOURCE_ATTRIBUTE,
};
pub use group::{group_targets, ElementGroup, SourceTasks, TaskPlan, TaskUrlMismatchError};
pub use messages::{parse_messages, MessagePool, MessagesEmptyError};
pub use state::{Effect, LoaderState, Msg};
pub use update::update;
