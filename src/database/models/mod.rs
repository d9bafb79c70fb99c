pub mod game;
pub mod image;
pub mod user;

pub use game::{Cardset, Game};
pub use image::{Image, ImageContent, ImageQuery, ImageScope, ImageSummary, NewImage};
pub use user::User;
