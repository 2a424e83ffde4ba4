//! Page objects for the bookstore UI.

pub mod books;

pub use books::BooksPage;
