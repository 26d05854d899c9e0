//! Port traits (interfaces) for dependency injection

pub mod transport;

pub use transport::{
    DriveTransport, ListQuery, NewFile, RemoteFile, RemoteFileList, TransportError, UploadBody,
};
