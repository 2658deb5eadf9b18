mod bubbling;
mod errors;
mod properties;
mod traversal;
mod updates;
