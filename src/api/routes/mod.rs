pub mod circuits;
pub mod constructors;
pub mod drivers;
pub mod health;
pub mod results;
pub mod seasons;
pub mod standings;
