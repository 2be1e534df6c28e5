pub mod access;
pub mod audit;
pub mod effect;
pub mod item;
pub mod messages;
pub mod placement;
pub mod scan;
pub mod seed;
pub mod session;
pub mod settings;
pub mod task;
pub mod trigger;
pub mod world;
