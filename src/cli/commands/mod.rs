pub(super) mod config;
pub(super) mod mark;
pub(super) mod page;
pub(super) mod serve;
pub(super) mod session;
pub(super) mod status;
