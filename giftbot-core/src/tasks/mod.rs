pub mod stockboard;
pub mod inflight;
