pub mod capture;
pub mod decrypt;
pub mod init;
pub mod inspect;
pub mod misc;
pub mod setup;
