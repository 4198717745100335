//! Account module (spec.md §3): the `Account` model and its repository.

mod models;
mod repository;

pub use models::{Account, AccountStatus};
pub use repository::AccountRepository;
