pub mod amortize;
pub mod changelog;
pub mod widget;
