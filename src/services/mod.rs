// Service exports
pub mod annotation;
pub mod scheduler;

pub use annotation::{AnnotationClient, AnnotationConfig, AnnotationError};
pub use scheduler::{AnnotationScheduler, SearchTicket};
