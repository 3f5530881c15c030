//! Entities and their repositories

mod kitty;
mod user;

pub use kitty::{CatBreed, CreateKitty, Kitty, KittyRepository, KittyWithKittens, UpdateKitty};
pub use user::{CreateUser, UpdateUser, User, UserRepository};
