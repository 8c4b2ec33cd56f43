pub mod extractor;
pub mod gateway;
pub mod history;
pub mod oracle;

use std::{future::Future, pin::Pin};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
