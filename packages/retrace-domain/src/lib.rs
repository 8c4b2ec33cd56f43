pub mod fallback;
pub mod payload;
pub mod text;
pub mod urls;
pub mod window;
