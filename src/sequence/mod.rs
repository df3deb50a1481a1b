pub(crate) mod naming;
pub(crate) mod reorder;
pub(crate) mod sequencer;
pub(crate) mod store;
