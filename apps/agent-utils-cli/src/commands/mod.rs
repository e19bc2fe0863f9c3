pub mod agent;
pub mod bundle;
pub mod classify;
pub mod daf;
pub mod descriptor;
pub mod logging;
pub mod memory;
mod util;
