// Adapters layer: concrete implementations for external systems (http, storage, clock).

pub mod clock;
pub mod http;
pub mod storage;
