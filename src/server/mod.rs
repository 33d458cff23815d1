/* src/server/mod.rs */

pub mod tarpit;
