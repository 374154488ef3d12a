pub mod notifier;
pub mod scanner;
