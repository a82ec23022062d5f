pub(crate) mod buffers;
pub(crate) mod commands;
pub mod context;
pub mod pipeline;
pub(crate) mod validation;
