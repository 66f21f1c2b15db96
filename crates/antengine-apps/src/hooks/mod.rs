//! Hook registration, callbacks and dispatch.

pub mod callback;
pub mod definitions;
pub mod dispatcher;
pub mod table;
