//! Cross-component scenarios run against a full [`crate::SearchService`].

mod scenarios;
