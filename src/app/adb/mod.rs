pub mod locator;
pub mod parse;
pub mod prober;
pub mod runner;
pub mod scrcpy;
