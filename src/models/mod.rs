pub mod cargo_post;
pub mod offer;
pub mod place;
pub mod transportation;
