pub mod markdown;
pub mod suggest;
pub mod time;
