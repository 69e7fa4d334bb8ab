mod counting;
mod session;
