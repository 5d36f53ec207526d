// src/file_system/mod.rs
// File system operations module

pub mod operations;

pub use operations::{
    create_file_exclusive,
    open_download,
    write_file_with_dirs,
    PendingUpload,
};
